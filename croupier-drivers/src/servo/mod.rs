//! Servo drivers
//!
//! - RC hobby servo on a 50 Hz PWM channel

pub mod rc;

pub use rc::{RcServo, SERVO_PERIOD_US};
