//! Servo sweep stepping
//!
//! The sweep walks the servo from the minimum to the maximum pulse width in
//! fixed steps, then jumps back to the minimum. Positions are pulse widths in
//! microseconds.

use crate::config::SweepConfig;

/// Returns true if moving from `prev` to `cur` passed over `target`
///
/// Movement is always in the increasing direction, so `prev > cur` means
/// the sweep wrapped from the top back to the bottom. A target equal to
/// `cur` counts as passed; a target equal to `prev` does not.
pub fn crossed(prev: u16, cur: u16, target: u16) -> bool {
    (prev < cur && prev < target && target <= cur) || (prev > cur && (prev < target || target <= cur))
}

/// Result of a single sweep step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Step {
    pub position: u16,
    /// The step jumped from the top of the range back to the bottom
    pub wrapped: bool,
}

/// Sweep position tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sweep {
    position: u16,
    previous: u16,
    warmup_left: u8,
    min_us: u16,
    max_us: u16,
    step_us: u16,
}

impl Sweep {
    /// Create a sweep parked at the minimum position
    pub fn new(config: &SweepConfig) -> Self {
        Self {
            position: config.min_pulse_us,
            previous: config.min_pulse_us,
            warmup_left: 0,
            min_us: config.min_pulse_us,
            max_us: config.max_pulse_us,
            step_us: config.step_us,
        }
    }

    pub fn position(&self) -> u16 {
        self.position
    }

    pub fn previous(&self) -> u16 {
        self.previous
    }

    /// Move back to the minimum position without a crossing
    pub fn park(&mut self) -> u16 {
        self.position = self.min_us;
        self.previous = self.min_us;
        self.position
    }

    /// Advance one step, wrapping to the minimum once the maximum is reached
    pub fn step(&mut self) -> Step {
        self.previous = self.position;
        let wrapped = self.position >= self.max_us;
        self.position = if wrapped {
            self.min_us
        } else {
            self.position.saturating_add(self.step_us).min(self.max_us)
        };
        Step {
            position: self.position,
            wrapped,
        }
    }

    /// Ignore detections for the next `steps` steps
    pub fn start_warmup(&mut self, steps: u8) {
        self.warmup_left = steps;
    }

    /// Count down one warm-up step
    ///
    /// Returns true on the step that finishes the warm-up.
    pub fn tick_warmup(&mut self) -> bool {
        if self.warmup_left == 0 {
            return false;
        }
        self.warmup_left -= 1;
        self.warmup_left == 0
    }

    pub fn warmed_up(&self) -> bool {
        self.warmup_left == 0
    }

    /// Did the last step pass over `target`?
    pub fn passed(&self, target: u16) -> bool {
        crossed(self.previous, self.position, target)
    }

    /// Is the sweep on `target`, or did the last step pass over it?
    pub fn reached(&self, target: u16) -> bool {
        self.position == target || self.passed(target)
    }
}
