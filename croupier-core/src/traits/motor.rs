//! Dispenser motor trait
//!
//! The dispenser is a small brushed motor on an H-bridge. Reverse throws the
//! top card out; forward pulls the next card back ("lock" or "tuck").

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Dispenser rotation direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Direction {
    /// Tuck cards back into the shoe
    #[default]
    Forward,
    /// Eject the top card
    Reverse,
}

/// Errors that can occur with motor operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotorError {
    /// A direction pin could not be driven
    Pin,
    /// The PWM channel rejected the duty cycle
    Pwm,
}

/// Trait for the dispenser motor driver
///
/// Calls are fire-and-forget: the dealer never waits on the motor. Drivers
/// that can fail should latch the error and report it through
/// [`DispenserMotor::fault`].
pub trait DispenserMotor {
    /// Run in `direction` at `duty_pct` (0-100)
    fn drive(&mut self, direction: Direction, duty_pct: u8);

    /// Release the bridge: both inputs low, no drive
    ///
    /// Used between direction reversals so the bridge can discharge.
    fn coast(&mut self);

    /// Stop driving (duty 0)
    fn stop_motor(&mut self);

    /// Last latched driver error, if any
    fn fault(&self) -> Option<MotorError> {
        None
    }
}
