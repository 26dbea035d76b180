//! Game mode button
//!
//! The button has a pull-up and reads low while pressed. It is sampled
//! every [`BUTTON_SAMPLE_MS`]; the stable level changes after
//! [`BUTTON_DEBOUNCE_SAMPLES`] consecutive samples disagree with it. Each
//! debounced press advances the game mode and produces
//! [`Event::ModeButton`] carrying the new mode index.

use embedded_hal::digital::InputPin;

use croupier_core::scheduler::Event;
use croupier_core::state::GameMode;

/// Sampling interval
pub const BUTTON_SAMPLE_MS: u64 = 5;

/// Consecutive samples needed to accept a new level
pub const BUTTON_DEBOUNCE_SAMPLES: u8 = 6;

/// Counting debouncer for an active-low button
#[derive(Debug, Clone)]
pub struct ButtonDebounce {
    /// Last accepted pin level (true = released)
    stable_high: bool,
    count: u8,
    mode: GameMode,
}

impl Default for ButtonDebounce {
    fn default() -> Self {
        Self::new(GameMode::default())
    }
}

impl ButtonDebounce {
    pub const fn new(mode: GameMode) -> Self {
        Self {
            stable_high: true,
            count: 0,
            mode,
        }
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    /// Feed one raw pin level; returns the event for a debounced press
    pub fn update(&mut self, pin_high: bool) -> Option<Event> {
        if pin_high == self.stable_high {
            self.count = 0;
            return None;
        }

        self.count += 1;
        if self.count < BUTTON_DEBOUNCE_SAMPLES {
            return None;
        }
        self.stable_high = pin_high;
        self.count = 0;

        if pin_high {
            return None;
        }
        self.mode = self.mode.next();
        Some(Event::ModeButton(self.mode.index()))
    }
}

/// Debounced mode button on an input pin
pub struct ModeButton<P> {
    pin: P,
    debounce: ButtonDebounce,
}

impl<P: InputPin> ModeButton<P> {
    pub fn new(pin: P) -> Self {
        Self {
            pin,
            debounce: ButtonDebounce::default(),
        }
    }

    pub fn mode(&self) -> GameMode {
        self.debounce.mode()
    }

    /// Take one sample; call every [`BUTTON_SAMPLE_MS`]
    ///
    /// A failed read counts as no sample.
    pub fn sample(&mut self) -> Option<Event> {
        let high = self.pin.is_high().ok()?;
        self.debounce.update(high)
    }
}
