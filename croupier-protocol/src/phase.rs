//! Dealer phase tags reported in `HSM=` event lines

/// Phase names as they appear on the telemetry stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PhaseTag {
    /// Switched off, actuators parked
    Idle,
    /// Sweeping to find players
    Calibrating,
    /// Dealing the first card to a newly found player
    CalibrationDeal,
    /// Sweeping toward the next player to deal
    Sweeping,
    /// Settling before a deal
    Delay,
    /// Ejecting a card
    Dealing,
    /// Every quota exhausted
    Done,
}

// Wire format values
const TAG_IDLE: &str = "IDLE";
const TAG_CALIBRATING: &str = "CAL";
const TAG_CALIBRATION_DEAL: &str = "FDEAL";
const TAG_SWEEPING: &str = "SWEEP";
const TAG_DELAY: &str = "DELAY";
const TAG_DEALING: &str = "DEAL";
const TAG_DONE: &str = "DONE";

impl PhaseTag {
    /// Parse a tag from its wire text
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            TAG_IDLE => Some(PhaseTag::Idle),
            TAG_CALIBRATING => Some(PhaseTag::Calibrating),
            TAG_CALIBRATION_DEAL => Some(PhaseTag::CalibrationDeal),
            TAG_SWEEPING => Some(PhaseTag::Sweeping),
            TAG_DELAY => Some(PhaseTag::Delay),
            TAG_DEALING => Some(PhaseTag::Dealing),
            TAG_DONE => Some(PhaseTag::Done),
            _ => None,
        }
    }

    /// Wire text for this tag
    pub fn as_str(self) -> &'static str {
        match self {
            PhaseTag::Idle => TAG_IDLE,
            PhaseTag::Calibrating => TAG_CALIBRATING,
            PhaseTag::CalibrationDeal => TAG_CALIBRATION_DEAL,
            PhaseTag::Sweeping => TAG_SWEEPING,
            PhaseTag::Delay => TAG_DELAY,
            PhaseTag::Dealing => TAG_DEALING,
            PhaseTag::Done => TAG_DONE,
        }
    }

    /// Returns true if the dispenser motor may be running in this phase
    pub fn is_dispensing(&self) -> bool {
        matches!(self, PhaseTag::CalibrationDeal | PhaseTag::Dealing)
    }
}
