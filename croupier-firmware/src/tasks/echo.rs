//! Echo timing task
//!
//! Times every HC-SR04 echo pulse, runs it through the ranging pipeline
//! and forwards zone changes to the dealer.

use defmt::*;
use embassy_rp::gpio::Input;
use embassy_time::{with_timeout, Duration, Instant};

use croupier_core::scheduler::Event;
use croupier_drivers::sensor::{echo_to_cm, measure_echo, RangeTracker};

use crate::channels::{DEALER_EVENTS, RANGING};

/// Longest wait for one echo; the sensor gives up after about 38 ms
const ECHO_TIMEOUT: Duration = Duration::from_millis(150);

/// Echo task - one measurement per ping
#[embassy_executor::task]
pub async fn echo_task(mut echo: Input<'static>) {
    info!("Echo task started");

    let mut tracker = RangeTracker::new();

    loop {
        let measured = with_timeout(
            ECHO_TIMEOUT,
            measure_echo(&mut echo, || Instant::now().as_micros()),
        )
        .await;

        // Timeouts are normal while ranging is off and nobody pings
        let Ok(Ok(echo_us)) = measured else {
            continue;
        };

        let cm = echo_to_cm(echo_us);
        trace!("Echo {} us = {} cm", echo_us, cm);

        if DEALER_EVENTS.try_send(Event::DistanceReady(cm)).is_err() {
            trace!("Event channel full, distance dropped");
        }
        if let Some(event) = tracker.update(echo_us, &RANGING) {
            debug!("Ranging: {:?} at {} cm", event, RANGING.filtered_cm());
            DEALER_EVENTS.send(event).await;
        }
    }
}
