//! Operator inputs
//!
//! - Game mode push button (debounced, cycles the mode)
//! - Power slide switch (raw level; the dealer debounces it)

pub mod button;
pub mod switch;

pub use button::{ButtonDebounce, ModeButton, BUTTON_DEBOUNCE_SAMPLES, BUTTON_SAMPLE_MS};
pub use switch::SlideSwitch;
