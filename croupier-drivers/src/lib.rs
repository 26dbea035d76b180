//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in croupier-core on top of embedded-hal:
//!
//! - Dispenser motor (H-bridge with PWM enable)
//! - Sweep servo (RC PWM)
//! - Ultrasonic ranging (HC-SR04 conversion, filtering, classification)
//! - Ultrasonic trigger service
//! - Mode button and power switch

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod input;
pub mod motor;
pub mod ping;
pub mod sensor;
pub mod servo;

#[cfg(test)]
mod mock;
