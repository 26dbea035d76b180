//! Configuration type definitions
//!
//! Tunables for the sweep, the dispenser and the watchdog. Defaults match the
//! reference hardware: a standard 1000-2500 µs hobby servo and a small
//! brushed motor on an H-bridge.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum number of players the dealer tracks
pub const MAX_PLAYERS: usize = 4;

/// Configuration validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Sweep lower bound is not below the upper bound
    InvalidSweepRange,
    /// Sweep step is zero or wider than the sweep range
    InvalidStep,
    /// A duration that must be non-zero is zero
    ZeroDuration,
    /// Fast duty is outside 1-100 %
    DutyOutOfRange,
    /// Watchdog would fire during normal operation
    WatchdogTooShort,
}

/// Servo sweep configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SweepConfig {
    /// Pulse width at the start of the sweep (µs)
    pub min_pulse_us: u16,
    /// Pulse width at the end of the sweep (µs)
    pub max_pulse_us: u16,
    /// Pulse increment per step (µs)
    pub step_us: u16,
    /// Time between steps (ms)
    pub step_ms: u32,
    /// Steps after calibration starts during which detections are ignored
    pub warmup_steps: u8,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            min_pulse_us: 1000,
            max_pulse_us: 2500,
            step_us: 20,
            step_ms: 70,
            warmup_steps: 10,
        }
    }
}

/// Card dispenser timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DispenseConfig {
    /// Pause after stopping the sweep before ejecting (ms)
    pub settle_ms: u32,
    /// Bridge discharge with both inputs low before reversing (ms)
    pub coast_ms: u32,
    /// Reverse run that throws the card (ms)
    pub eject_ms: u32,
    /// Forward run that tucks the next card back (ms)
    pub lock_ms: u32,
    /// Forward tuck at sweep wraparound and on reset (ms)
    pub nudge_ms: u32,
    /// Duty used for every dispenser move (%)
    pub fast_duty_pct: u8,
}

impl Default for DispenseConfig {
    fn default() -> Self {
        Self {
            settle_ms: 800,
            coast_ms: 1,
            eject_ms: 350,
            lock_ms: 175,
            nudge_ms: 100,
            fast_duty_pct: 100,
        }
    }
}

impl DispenseConfig {
    /// Time from the end of a sweep step until the card is locked
    ///
    /// Saturates at `u32::MAX`, which no watchdog can outlast.
    pub fn sequence_ms(&self) -> u32 {
        self.settle_ms
            .saturating_add(self.coast_ms)
            .saturating_add(self.eject_ms)
            .saturating_add(self.lock_ms)
    }
}

/// Player detection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DetectionConfig {
    /// A detection closer than this to the previous player is the same player (µs)
    pub min_separation_us: u16,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            min_separation_us: 250,
        }
    }
}

/// Complete dealer configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DealerConfig {
    pub sweep: SweepConfig,
    pub dispense: DispenseConfig,
    pub detection: DetectionConfig,
    /// Stall timeout; every sweep step restarts it (ms)
    pub watchdog_ms: u32,
}

impl Default for DealerConfig {
    fn default() -> Self {
        Self {
            sweep: SweepConfig::default(),
            dispense: DispenseConfig::default(),
            detection: DetectionConfig::default(),
            watchdog_ms: 3000,
        }
    }
}

impl DealerConfig {
    /// Check that the configuration describes a machine that can run
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sweep = &self.sweep;
        if sweep.min_pulse_us >= sweep.max_pulse_us {
            return Err(ConfigError::InvalidSweepRange);
        }
        if sweep.step_us == 0 || sweep.step_us > sweep.max_pulse_us - sweep.min_pulse_us {
            return Err(ConfigError::InvalidStep);
        }

        let dispense = &self.dispense;
        // coast_ms may be zero: the bridge then reverses on the next tick
        if sweep.step_ms == 0
            || dispense.settle_ms == 0
            || dispense.eject_ms == 0
            || dispense.lock_ms == 0
            || dispense.nudge_ms == 0
        {
            return Err(ConfigError::ZeroDuration);
        }
        if dispense.fast_duty_pct == 0 || dispense.fast_duty_pct > 100 {
            return Err(ConfigError::DutyOutOfRange);
        }

        // The watchdog is only kicked between sweep steps, so it must outlast
        // a full dispense sequence and the wraparound tuck.
        let longest_gap = sweep
            .step_ms
            .max(dispense.sequence_ms())
            .max(dispense.nudge_ms.saturating_add(dispense.sequence_ms()));
        if self.watchdog_ms <= longest_gap {
            return Err(ConfigError::WatchdogTooShort);
        }

        Ok(())
    }

    /// Number of steps in one full sweep
    pub fn steps_per_sweep(&self) -> u16 {
        let span = self.sweep.max_pulse_us.saturating_sub(self.sweep.min_pulse_us);
        span.div_ceil(self.sweep.step_us.max(1))
    }
}
