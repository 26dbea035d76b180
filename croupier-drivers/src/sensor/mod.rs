//! Sensor drivers
//!
//! - HC-SR04 ultrasonic ranging helpers

pub mod ultrasonic;

pub use ultrasonic::{
    echo_to_cm, measure_echo, MedianFilter, Proximity, ProximityClassifier, RangeTracker, SharedRanging,
    FAR_CM, NEAR_CM, US_PER_CM,
};
