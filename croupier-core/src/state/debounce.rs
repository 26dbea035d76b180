//! Power switch debouncing
//!
//! The raw switch level is shifted into an 8-bit history once per handled
//! event. The settled level only changes when all eight samples agree.

/// Debounced switch position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SwitchLevel {
    Off,
    On,
}

/// 8-sample shift-register debouncer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchDebounce {
    history: u8,
    settled: SwitchLevel,
}

impl SwitchDebounce {
    /// Start from the level read at power-up
    ///
    /// The settled level starts out opposite to the reading so that the
    /// first sample reports the real position as an edge.
    pub fn new(raw_on: bool) -> Self {
        if raw_on {
            Self {
                history: 0xFF,
                settled: SwitchLevel::Off,
            }
        } else {
            Self {
                history: 0x00,
                settled: SwitchLevel::On,
            }
        }
    }

    pub fn settled(&self) -> SwitchLevel {
        self.settled
    }

    /// Shift in one raw sample; returns the new level on a settled edge
    pub fn sample(&mut self, raw_on: bool) -> Option<SwitchLevel> {
        self.history = (self.history << 1) | raw_on as u8;
        let level = match self.history {
            0xFF => SwitchLevel::On,
            0x00 => SwitchLevel::Off,
            _ => return None,
        };
        if level == self.settled {
            return None;
        }
        self.settled = level;
        Some(level)
    }
}
