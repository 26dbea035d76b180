//! Dealer task
//!
//! Owns the scheduler and runs it as the main event loop:
//!
//! 1. Move events from the input and echo tasks into service queues
//! 2. Advance software timers by the elapsed wall-clock time
//! 3. Dispatch until no service has work left; every pass also samples the
//!    power switch, so it is debounced over roughly 8 ms
//! 4. Sleep until the next event or the next millisecond

use core::sync::atomic::Ordering;

use defmt::*;
use embassy_rp::gpio::Output;
use embassy_time::{with_timeout, Delay, Duration, Instant};

use croupier_core::config::DealerConfig;
use croupier_core::scheduler::{Event, Framework, ServiceId};
use croupier_core::state::DealerService;
use croupier_drivers::ping::PingService;

use crate::board::Board;
use crate::channels::{DEALER_EVENTS, DROPPED_LINES, RANGING};

/// Dealer queue depth
const DEALER_QUEUE: usize = 8;

/// Ping service queue depth
const PING_QUEUE: usize = 4;

/// Dealer task - runs the scheduler forever
#[embassy_executor::task]
pub async fn dealer_task(config: DealerConfig, board: Board, trigger: Output<'static>) {
    info!("Dealer task started");

    let mut dealer = DealerService::new(config, board);
    let mut ping = PingService::new(trigger, Delay, &RANGING);

    let mut framework = Framework::new();
    // Registration only fails past MAX_SERVICES
    let dealer_id = unwrap!(framework.register(&mut dealer, 0, DEALER_QUEUE));
    let ping_id = unwrap!(framework.register(&mut ping, 1, PING_QUEUE));
    framework.initialize_all();
    info!("Scheduler running with {} services", framework.len());

    let mut last = Instant::now();
    let mut dropped_lines = 0;

    loop {
        while let Ok(event) = DEALER_EVENTS.try_receive() {
            route(&mut framework, event, dealer_id, ping_id);
        }

        let elapsed_ms = last.elapsed().as_millis();
        if elapsed_ms > 0 {
            // Keep the sub-millisecond remainder for the next pass
            last += Duration::from_millis(elapsed_ms);
            let dropped = framework.tick(elapsed_ms.min(u32::MAX as u64) as u32);
            if dropped > 0 {
                warn!("{} timeouts dropped on full queues", dropped);
            }
        }

        while framework.run_once() {}

        let lost = DROPPED_LINES.load(Ordering::Relaxed);
        if lost != dropped_lines {
            warn!("{} telemetry lines dropped", lost - dropped_lines);
            dropped_lines = lost;
        }

        if let Ok(event) = with_timeout(Duration::from_millis(1), DEALER_EVENTS.receive()).await {
            route(&mut framework, event, dealer_id, ping_id);
        }
    }
}

/// Deliver an event from outside the scheduler
fn route(framework: &mut Framework<'_>, event: Event, dealer: ServiceId, ping: ServiceId) {
    let result = match event {
        Event::ModeButton(_) => framework.post_all(event),
        Event::DistanceReady(_) => framework.post_to(ping, event),
        _ => framework.post_to(dealer, event),
    };
    if let Err(e) = result {
        warn!("Dropped {:?}: {:?}", event, e);
    }
}
