//! Dispenser motor on an H-bridge
//!
//! Two direction inputs pick the rotation and a PWM channel on the bridge
//! enable pin sets the power:
//!
//! | Command  | IN1  | IN2  | Enable duty |
//! |----------|------|------|-------------|
//! | forward  | high | low  | requested   |
//! | reverse  | low  | high | requested   |
//! | coast    | low  | low  | 0           |
//! | stop     | kept | kept | 0           |
//!
//! Pin and PWM errors never panic. The first error is latched and reported
//! through [`DispenserMotor::fault`] until [`HBridgeMotor::clear_fault`].

use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;

use croupier_core::traits::{Direction, DispenserMotor, MotorError};

/// What the bridge is currently doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BridgeState {
    Stopped,
    Coasting,
    Driving(Direction, u8),
}

/// H-bridge dispenser motor driver
pub struct HBridgeMotor<A, B, E> {
    in1: A,
    in2: B,
    enable: E,
    state: BridgeState,
    fault: Option<MotorError>,
}

impl<A, B, E> HBridgeMotor<A, B, E>
where
    A: OutputPin,
    B: OutputPin,
    E: SetDutyCycle,
{
    /// Create the driver with the bridge released
    pub fn new(in1: A, in2: B, enable: E) -> Self {
        let mut motor = Self {
            in1,
            in2,
            enable,
            state: BridgeState::Stopped,
            fault: None,
        };
        motor.coast();
        motor.state = BridgeState::Stopped;
        motor
    }

    pub fn state(&self) -> BridgeState {
        self.state
    }

    /// Forget a latched error
    pub fn clear_fault(&mut self) {
        self.fault = None;
    }

    fn latch(&mut self, error: MotorError) {
        if self.fault.is_none() {
            self.fault = Some(error);
        }
    }

    fn set_inputs(&mut self, in1_high: bool, in2_high: bool) {
        let in1 = if in1_high {
            self.in1.set_high()
        } else {
            self.in1.set_low()
        };
        let in2 = if in2_high {
            self.in2.set_high()
        } else {
            self.in2.set_low()
        };
        if in1.is_err() || in2.is_err() {
            self.latch(MotorError::Pin);
        }
    }

    fn set_duty(&mut self, duty_pct: u8) {
        if self
            .enable
            .set_duty_cycle_percent(duty_pct.min(100))
            .is_err()
        {
            self.latch(MotorError::Pwm);
        }
    }
}

impl<A, B, E> DispenserMotor for HBridgeMotor<A, B, E>
where
    A: OutputPin,
    B: OutputPin,
    E: SetDutyCycle,
{
    fn drive(&mut self, direction: Direction, duty_pct: u8) {
        match direction {
            Direction::Forward => self.set_inputs(true, false),
            Direction::Reverse => self.set_inputs(false, true),
        }
        self.set_duty(duty_pct);
        self.state = BridgeState::Driving(direction, duty_pct.min(100));
    }

    fn coast(&mut self) {
        self.set_duty(0);
        self.set_inputs(false, false);
        self.state = BridgeState::Coasting;
    }

    fn stop_motor(&mut self) {
        self.set_duty(0);
        self.state = BridgeState::Stopped;
    }

    fn fault(&self) -> Option<MotorError> {
        self.fault
    }
}
