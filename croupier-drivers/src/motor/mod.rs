//! Motor driver implementations
//!
//! - Brushed DC dispenser motor on an H-bridge

pub mod hbridge;

pub use hbridge::{BridgeState, HBridgeMotor};
