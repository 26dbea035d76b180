//! Hardware abstraction traits
//!
//! These traits define the interface between the dealing logic and the
//! board-specific drivers.

pub mod indicator;
pub mod motor;
pub mod sensor;
pub mod servo;

pub use indicator::{ModeIndicator, TelemetrySink};
pub use motor::{Direction, DispenserMotor, MotorError};
pub use sensor::{RangeSensor, SwitchInput};
pub use servo::SweepServo;

/// Everything the dealer drives
///
/// Implemented automatically for any type providing all of the individual
/// traits, so a board can hand a single struct to the dealer service.
pub trait DealerIo:
    SweepServo + DispenserMotor + RangeSensor + SwitchInput + ModeIndicator + TelemetrySink
{
}

impl<T> DealerIo for T where
    T: SweepServo + DispenserMotor + RangeSensor + SwitchInput + ModeIndicator + TelemetrySink
{
}
