//! RC servo on a PWM channel
//!
//! The channel runs at 50 Hz, so one period is 20 000 µs and the pulse
//! width maps linearly onto the channel's duty range.

use embedded_hal::pwm::SetDutyCycle;

use croupier_core::config::SweepConfig;
use croupier_core::traits::SweepServo;

/// PWM period of a standard RC servo
pub const SERVO_PERIOD_US: u32 = 20_000;

/// Sweep servo driver
pub struct RcServo<P> {
    channel: P,
    min_us: u16,
    max_us: u16,
    pulse_us: u16,
    fault: bool,
}

impl<P: SetDutyCycle> RcServo<P> {
    /// Create a servo limited to `min_us..=max_us`, parked at `min_us`
    pub fn new(channel: P, min_us: u16, max_us: u16) -> Self {
        let mut servo = Self {
            channel,
            min_us,
            max_us: max_us.max(min_us),
            pulse_us: min_us,
            fault: false,
        };
        servo.set_pulse_us(min_us);
        servo
    }

    /// Create a servo covering the configured sweep
    pub fn for_sweep(channel: P, sweep: &SweepConfig) -> Self {
        Self::new(channel, sweep.min_pulse_us, sweep.max_pulse_us)
    }

    /// Last commanded pulse width
    pub fn pulse_us(&self) -> u16 {
        self.pulse_us
    }

    /// Check if the channel ever rejected a duty
    pub fn fault(&self) -> bool {
        self.fault
    }

    /// Duty value for a pulse width on this channel
    pub fn duty_for(&self, pulse_us: u16) -> u16 {
        let max = self.channel.max_duty_cycle() as u32;
        (pulse_us as u32 * max / SERVO_PERIOD_US).min(max) as u16
    }
}

impl<P: SetDutyCycle> SweepServo for RcServo<P> {
    fn set_pulse_us(&mut self, pulse_us: u16) {
        let pulse_us = pulse_us.clamp(self.min_us, self.max_us);
        let duty = self.duty_for(pulse_us);
        if self.channel.set_duty_cycle(duty).is_err() {
            self.fault = true;
        }
        self.pulse_us = pulse_us;
    }
}
