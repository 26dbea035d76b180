//! HC-SR04 ultrasonic ranging
//!
//! The sensor answers a 10 µs trigger pulse with an echo pulse as long as
//! the sound's round trip. Turning that into dealer events takes three
//! steps:
//!
//! 1. Convert the echo width to centimeters ([`echo_to_cm`])
//! 2. Drop single-sample glitches ([`MedianFilter`])
//! 3. Classify into near/middle/far and report zone changes
//!    ([`ProximityClassifier`])
//!
//! [`RangeTracker`] chains them and publishes the readings through
//! [`SharedRanging`] so the board can read them back for telemetry.

use core::sync::atomic::{AtomicBool, AtomicU16, Ordering};

use embedded_hal_async::digital::Wait;

use croupier_core::scheduler::Event;

/// Echo microseconds per centimeter of distance (round trip)
pub const US_PER_CM: u32 = 58;

/// Readings below this are a player
pub const NEAR_CM: u16 = 35;

/// Readings above this are empty space
pub const FAR_CM: u16 = 90;

/// Convert an echo pulse width to centimeters
pub fn echo_to_cm(echo_us: u32) -> u16 {
    (echo_us / US_PER_CM).min(u16::MAX as u32) as u16
}

/// Time one echo pulse
///
/// Waits for the echo line to rise, then for it to fall, and returns the
/// pulse width. `now_us` is a free-running microsecond clock. The caller
/// bounds the wait; a missing sensor never raises the line.
pub async fn measure_echo<P: Wait>(
    echo: &mut P,
    mut now_us: impl FnMut() -> u64,
) -> Result<u32, P::Error> {
    echo.wait_for_high().await?;
    let start = now_us();
    echo.wait_for_low().await?;
    let width = now_us().saturating_sub(start);
    Ok(width.min(u32::MAX as u64) as u32)
}

/// Median of the last three readings
#[derive(Debug, Clone, Default)]
pub struct MedianFilter {
    window: [u16; 3],
    len: u8,
    next: u8,
}

impl MedianFilter {
    pub const fn new() -> Self {
        Self {
            window: [0; 3],
            len: 0,
            next: 0,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Add a reading and return the filtered value
    ///
    /// Until three readings are in, the newest reading passes through.
    pub fn update(&mut self, cm: u16) -> u16 {
        self.window[self.next as usize] = cm;
        self.next = (self.next + 1) % 3;
        if self.len < 3 {
            self.len += 1;
            return cm;
        }

        let [a, b, c] = self.window;
        a.max(b).min(a.min(b).max(c))
    }
}

/// Distance zone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Proximity {
    Near,
    Middle,
    Far,
}

impl Proximity {
    pub fn classify(cm: u16) -> Self {
        if cm < NEAR_CM {
            Proximity::Near
        } else if cm > FAR_CM {
            Proximity::Far
        } else {
            Proximity::Middle
        }
    }
}

/// Reports near/far transitions
///
/// The middle band is a dead zone: entering it is silent, but it still
/// counts as a change, so near → middle → near reports near twice.
#[derive(Debug, Clone, Default)]
pub struct ProximityClassifier {
    last: Option<Proximity>,
}

impl ProximityClassifier {
    pub const fn new() -> Self {
        Self { last: None }
    }

    /// Forget the last zone; the next reading always reports
    pub fn reset(&mut self) {
        self.last = None;
    }

    pub fn zone(&self) -> Option<Proximity> {
        self.last
    }

    pub fn update(&mut self, cm: u16) -> Option<Event> {
        let zone = Proximity::classify(cm);
        if self.last == Some(zone) {
            return None;
        }
        self.last = Some(zone);
        match zone {
            Proximity::Near => Some(Event::ObjectNear),
            Proximity::Far => Some(Event::ObjectFar),
            Proximity::Middle => None,
        }
    }
}

/// Ranging state shared between the echo task and the board
///
/// Only plain loads and stores are used, so this works on cores without
/// compare-and-swap.
pub struct SharedRanging {
    enabled: AtomicBool,
    reset: AtomicBool,
    raw_cm: AtomicU16,
    filtered_cm: AtomicU16,
}

impl Default for SharedRanging {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedRanging {
    pub const fn new() -> Self {
        Self {
            enabled: AtomicBool::new(false),
            reset: AtomicBool::new(false),
            raw_cm: AtomicU16::new(0),
            filtered_cm: AtomicU16::new(0),
        }
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    pub fn enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Ask the echo task to clear its filter state
    pub fn request_reset(&self) {
        self.reset.store(true, Ordering::Release);
    }

    /// Check and clear a pending reset request
    pub fn take_reset(&self) -> bool {
        let pending = self.reset.load(Ordering::Acquire);
        if pending {
            self.reset.store(false, Ordering::Release);
        }
        pending
    }

    pub fn publish(&self, raw_cm: u16, filtered_cm: u16) {
        self.raw_cm.store(raw_cm, Ordering::Relaxed);
        self.filtered_cm.store(filtered_cm, Ordering::Relaxed);
    }

    pub fn raw_cm(&self) -> u16 {
        self.raw_cm.load(Ordering::Relaxed)
    }

    pub fn filtered_cm(&self) -> u16 {
        self.filtered_cm.load(Ordering::Relaxed)
    }
}

/// Echo processing pipeline
#[derive(Debug, Clone, Default)]
pub struct RangeTracker {
    filter: MedianFilter,
    classifier: ProximityClassifier,
}

impl RangeTracker {
    pub const fn new() -> Self {
        Self {
            filter: MedianFilter::new(),
            classifier: ProximityClassifier::new(),
        }
    }

    /// Process one echo
    ///
    /// Readings are always published; zone events are only produced while
    /// ranging is enabled.
    pub fn update(&mut self, echo_us: u32, shared: &SharedRanging) -> Option<Event> {
        if shared.take_reset() {
            self.filter.reset();
            self.classifier.reset();
        }

        let raw = echo_to_cm(echo_us);
        let filtered = self.filter.update(raw);
        shared.publish(raw, filtered);

        if !shared.enabled() {
            return None;
        }
        self.classifier.update(filtered)
    }
}
