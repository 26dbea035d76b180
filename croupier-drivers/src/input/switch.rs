//! Power slide switch
//!
//! Wired to ground with a pull-up: the pin reads low when the switch is on.
//! Debouncing happens in the dealer, which samples it once per event.

use embedded_hal::digital::InputPin;

use croupier_core::traits::SwitchInput;

pub struct SlideSwitch<P> {
    pin: P,
}

impl<P: InputPin> SlideSwitch<P> {
    pub fn new(pin: P) -> Self {
        Self { pin }
    }
}

impl<P: InputPin> SwitchInput for SlideSwitch<P> {
    /// A failed read counts as off
    fn switch_on(&mut self) -> bool {
        self.pin.is_low().unwrap_or(false)
    }
}
