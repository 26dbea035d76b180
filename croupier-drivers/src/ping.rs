//! Ultrasonic trigger service
//!
//! Runs on the scheduler next to the dealer. Every [`PING_INTERVAL_MS`] it
//! fires a [`TRIGGER_PULSE_US`] pulse on the HC-SR04 trigger pin, but only
//! while the dealer has ranging enabled. The echo is timed elsewhere and
//! reported back as [`Event::DistanceReady`]; a ping with no answer by the
//! next ping counts as missed.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use croupier_core::scheduler::{Context, Event, Service, TimerId};

use crate::sensor::SharedRanging;

/// Timer owned by the ping service
pub const PING_TIMER: TimerId = TimerId(4);

/// Time between pings
pub const PING_INTERVAL_MS: u32 = 100;

/// Trigger pulse width
pub const TRIGGER_PULSE_US: u32 = 10;

pub struct PingService<'r, P, D> {
    trigger: P,
    delay: D,
    ranging: &'r SharedRanging,
    pings: u32,
    missed: u32,
    awaiting_echo: bool,
}

impl<'r, P: OutputPin, D: DelayNs> PingService<'r, P, D> {
    pub fn new(trigger: P, delay: D, ranging: &'r SharedRanging) -> Self {
        Self {
            trigger,
            delay,
            ranging,
            pings: 0,
            missed: 0,
            awaiting_echo: false,
        }
    }

    /// Number of trigger pulses sent
    pub fn pings(&self) -> u32 {
        self.pings
    }

    /// Pings that got no echo before the next ping
    pub fn missed(&self) -> u32 {
        self.missed
    }

    fn fire(&mut self) {
        if self.awaiting_echo {
            self.missed = self.missed.wrapping_add(1);
        }
        // A stuck trigger pin just means no echo this round
        self.awaiting_echo = self.trigger.set_high().is_ok();
        if self.awaiting_echo {
            self.delay.delay_us(TRIGGER_PULSE_US);
            self.pings = self.pings.wrapping_add(1);
        }
        let _ = self.trigger.set_low();
    }
}

impl<'r, P: OutputPin, D: DelayNs> Service for PingService<'r, P, D> {
    fn init(&mut self, ctx: &mut Context<'_>) {
        let _ = self.trigger.set_low();
        let _ = ctx.arm_timer(PING_TIMER, PING_INTERVAL_MS);
    }

    fn handle(&mut self, event: Event, ctx: &mut Context<'_>) {
        match event {
            Event::DistanceReady(_) => self.awaiting_echo = false,
            Event::Timeout(id) if id == PING_TIMER => {
                if self.ranging.enabled() {
                    self.fire();
                } else {
                    self.awaiting_echo = false;
                }
                let _ = ctx.arm_timer(PING_TIMER, PING_INTERVAL_MS);
            }
            _ => {}
        }
    }
}
