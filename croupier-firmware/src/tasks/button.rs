//! Game button task
//!
//! Samples the mode button on a fixed tick and forwards debounced presses.

use defmt::*;
use embassy_rp::gpio::Input;
use embassy_time::{Duration, Ticker};

use croupier_drivers::input::{ModeButton, BUTTON_SAMPLE_MS};

use crate::channels::DEALER_EVENTS;

/// Button task - samples every BUTTON_SAMPLE_MS
#[embassy_executor::task]
pub async fn button_task(pin: Input<'static>) {
    info!("Button task started");

    let mut button = ModeButton::new(pin);
    let mut ticker = Ticker::every(Duration::from_millis(BUTTON_SAMPLE_MS));

    loop {
        ticker.next().await;

        if let Some(event) = button.sample() {
            info!("Game mode: {}", button.mode().name());
            DEALER_EVENTS.send(event).await;
        }
    }
}
