//! Board wiring
//!
//! Pin assignments for a Raspberry Pi Pico based dealer and the
//! [`DealerIo`](croupier_core::traits::DealerIo) implementation the dealer
//! service drives.
//!
//! | Function        | Pin    | Notes                          |
//! |-----------------|--------|--------------------------------|
//! | Telemetry TX/RX | GPIO0/1| UART0, 115200 baud             |
//! | Sweep servo     | GPIO2  | PWM slice 1 A, 50 Hz           |
//! | Motor enable    | GPIO4  | PWM slice 2 A                  |
//! | Motor IN1/IN2   | GPIO6/7|                                |
//! | HC-SR04 trigger | GPIO8  |                                |
//! | HC-SR04 echo    | GPIO9  | 5 V echo through a divider     |
//! | Power switch    | GPIO10 | Pull-up, on = low              |
//! | Game button     | GPIO11 | Pull-up, pressed = low         |
//! | Mode LEDs       | GPIO12/13 |                             |

use core::sync::atomic::Ordering;

use defmt::*;
use embassy_rp::gpio::{Input, Output};
use embassy_rp::pwm::{self, PwmOutput};

use croupier_core::state::GameMode;
use croupier_core::traits::{
    Direction, DispenserMotor, ModeIndicator, RangeSensor, SweepServo, SwitchInput,
    TelemetrySink,
};
use croupier_drivers::input::SlideSwitch;
use croupier_drivers::motor::HBridgeMotor;
use croupier_drivers::sensor::SharedRanging;
use croupier_drivers::servo::RcServo;
use croupier_protocol::Record;

use crate::channels::{DROPPED_LINES, TELEMETRY};

/// Servo PWM: 125 MHz / 125 = 1 MHz counter, 20 000 counts = 50 Hz
pub fn servo_pwm_config() -> pwm::Config {
    let mut config = pwm::Config::default();
    config.divider = 125.into();
    config.top = 19_999;
    config
}

/// Motor PWM: about 122 kHz, above hearing
pub fn motor_pwm_config() -> pwm::Config {
    let mut config = pwm::Config::default();
    config.top = 1023;
    config
}

pub type Servo = RcServo<PwmOutput<'static>>;
pub type Motor = HBridgeMotor<Output<'static>, Output<'static>, PwmOutput<'static>>;

/// Everything the dealer touches
pub struct Board {
    pub servo: Servo,
    pub motor: Motor,
    pub switch: SlideSwitch<Input<'static>>,
    pub leds: [Output<'static>; 2],
    pub ranging: &'static SharedRanging,
}

impl SweepServo for Board {
    fn set_pulse_us(&mut self, pulse_us: u16) {
        self.servo.set_pulse_us(pulse_us);
    }
}

impl DispenserMotor for Board {
    fn drive(&mut self, direction: Direction, duty_pct: u8) {
        trace!("Motor {:?} at {}%", direction, duty_pct);
        self.motor.drive(direction, duty_pct);
    }

    fn coast(&mut self) {
        self.motor.coast();
    }

    fn stop_motor(&mut self) {
        self.motor.stop_motor();
        if let Some(fault) = self.motor.fault() {
            warn!("Motor driver fault: {:?}", fault);
            self.motor.clear_fault();
        }
    }

    fn fault(&self) -> Option<croupier_core::traits::MotorError> {
        self.motor.fault()
    }
}

impl RangeSensor for Board {
    fn set_ranging(&mut self, enabled: bool) {
        debug!("Ranging {}", if enabled { "on" } else { "off" });
        self.ranging.set_enabled(enabled);
    }

    fn reset_filter(&mut self) {
        self.ranging.request_reset();
    }

    fn raw_cm(&self) -> u16 {
        self.ranging.raw_cm()
    }

    fn filtered_cm(&self) -> u16 {
        self.ranging.filtered_cm()
    }
}

impl SwitchInput for Board {
    fn switch_on(&mut self) -> bool {
        self.switch.switch_on()
    }
}

impl ModeIndicator for Board {
    fn show_mode(&mut self, mode: Option<GameMode>) {
        let pattern = mode.map_or(0, GameMode::led_pattern);
        for (bit, led) in self.leds.iter_mut().enumerate() {
            if pattern & (1 << bit) != 0 {
                led.set_high();
            } else {
                led.set_low();
            }
        }
    }
}

impl TelemetrySink for Board {
    fn emit(&mut self, record: &Record<'_>) {
        let line = match record.to_line() {
            Ok(line) => line,
            Err(e) => {
                warn!("Telemetry record not encodable: {:?}", e);
                return;
            }
        };
        if record.is_event() {
            debug!("{}", line.trim_end());
        }
        if TELEMETRY.try_send(line).is_err() {
            DROPPED_LINES.fetch_add(1, Ordering::Relaxed);
        }
    }
}
