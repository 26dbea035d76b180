//! Countdown timers
//!
//! A fixed bank of one-shot millisecond timers. Each armed timer belongs to
//! the service that armed it and expires exactly once; it then stays dormant
//! until armed again. Time only moves when [`TimerSubsystem::tick`] is called,
//! so the bank can be driven by a hardware tick or by a test.

use heapless::Vec;

use super::event::{ServiceId, TimerId};

/// Number of timers in the bank
pub const MAX_TIMERS: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Timer {
    remaining_ms: u32,
    armed: bool,
    owner: ServiceId,
}

impl Timer {
    const IDLE: Timer = Timer {
        remaining_ms: 0,
        armed: false,
        owner: ServiceId(0),
    };
}

/// A timer that ran out during a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Expiry {
    pub timer: TimerId,
    pub owner: ServiceId,
}

/// Bank of one-shot countdown timers
#[derive(Debug, Clone)]
pub struct TimerSubsystem {
    timers: [Timer; MAX_TIMERS],
}

impl Default for TimerSubsystem {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerSubsystem {
    pub const fn new() -> Self {
        Self {
            timers: [Timer::IDLE; MAX_TIMERS],
        }
    }

    /// Arm (or re-arm) a timer for `duration_ms` on behalf of `owner`
    ///
    /// Re-arming a running timer restarts it; only the new expiry is
    /// delivered. Returns false if `id` is outside the bank.
    pub fn arm(&mut self, id: TimerId, duration_ms: u32, owner: ServiceId) -> bool {
        match self.timers.get_mut(id.index()) {
            Some(timer) => {
                *timer = Timer {
                    remaining_ms: duration_ms,
                    armed: true,
                    owner,
                };
                true
            }
            None => false,
        }
    }

    /// Disarm a timer. Cancelling a timer that already fired is a no-op.
    pub fn cancel(&mut self, id: TimerId) {
        if let Some(timer) = self.timers.get_mut(id.index()) {
            timer.armed = false;
        }
    }

    pub fn is_armed(&self, id: TimerId) -> bool {
        self.timers.get(id.index()).is_some_and(|t| t.armed)
    }

    /// Time left on an armed timer
    pub fn remaining_ms(&self, id: TimerId) -> Option<u32> {
        self.timers
            .get(id.index())
            .filter(|t| t.armed)
            .map(|t| t.remaining_ms)
    }

    /// Advance every armed timer by `elapsed_ms`
    ///
    /// Returns the timers that reached zero, in ascending id order. Each is
    /// disarmed, so it is reported exactly once.
    pub fn tick(&mut self, elapsed_ms: u32) -> Vec<Expiry, MAX_TIMERS> {
        let mut expired = Vec::new();
        for (index, timer) in self.timers.iter_mut().enumerate() {
            if !timer.armed {
                continue;
            }
            timer.remaining_ms = timer.remaining_ms.saturating_sub(elapsed_ms);
            if timer.remaining_ms == 0 {
                timer.armed = false;
                // Cannot overflow: at most one entry per timer
                let _ = expired.push(Expiry {
                    timer: TimerId(index as u8),
                    owner: timer.owner,
                });
            }
        }
        expired
    }

    /// Milliseconds until the next expiry, if any timer is armed
    pub fn next_expiry_ms(&self) -> Option<u32> {
        self.timers
            .iter()
            .filter(|t| t.armed)
            .map(|t| t.remaining_ms)
            .min()
    }
}
