//! Events and identifiers
//!
//! Events are small `Copy` values: a kind plus an optional 16-bit parameter.
//! The scheduler moves them between queues without looking inside.

/// Identifies one of the countdown timers
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimerId(pub u8);

impl TimerId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Identifies a registered service
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ServiceId(pub(crate) u8);

impl ServiceId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Events delivered to services
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// Nothing happened
    NoEvent,
    /// Startup notification
    Init,
    /// State entry (reserved)
    Entry,
    /// State exit (reserved)
    Exit,
    /// A timer expired
    Timeout(TimerId),
    /// Ranging saw an object enter the near band
    ObjectNear,
    /// Ranging saw the object leave toward the far band
    ObjectFar,
    /// Mode button pressed; carries the new mode index
    ModeButton(u16),
    /// A fresh distance reading in cm
    DistanceReady(u16),
}

impl Event {
    /// The 16-bit parameter carried by this event (0 if none)
    pub fn param(&self) -> u16 {
        match *self {
            Event::Timeout(id) => id.0 as u16,
            Event::ModeButton(index) => index,
            Event::DistanceReady(cm) => cm,
            _ => 0,
        }
    }

    /// Returns true if this is the expiry of the given timer
    pub fn is_timeout(&self, id: TimerId) -> bool {
        matches!(*self, Event::Timeout(t) if t == id)
    }
}
