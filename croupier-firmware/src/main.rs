//! Croupier - Card Dealing Robot Firmware
//!
//! Main firmware binary for RP2040-based card dealers. A servo sweeps an
//! ultrasonic sensor across the table to find the players, then a
//! dispenser motor deals each of them their cards in turn.
//!
//! All dealing logic runs on the cooperative scheduler from croupier-core
//! inside the dealer task; the other tasks only feed it events or carry
//! its telemetry out.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::peripherals::UART0;
use embassy_rp::pwm::Pwm;
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use croupier_drivers::input::SlideSwitch;
use croupier_drivers::motor::HBridgeMotor;
use croupier_drivers::servo::RcServo;

use crate::board::{motor_pwm_config, servo_pwm_config, Board};
use crate::channels::RANGING;

mod board;
mod channels;
mod config;
mod tasks;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 16]> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Croupier firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let config = config::load_config();

    // Telemetry console
    let uart_config = UartConfig::default(); // 115200 baud default
    let tx_buf = TX_BUF.init([0u8; 256]);
    let rx_buf = RX_BUF.init([0u8; 16]);
    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, uart_config);
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);
    let (tx, _rx) = uart.split();
    info!("UART initialized for telemetry");

    // Sweep servo on PWM slice 1 A
    let servo_pwm = Pwm::new_output_a(p.PWM_SLICE1, p.PIN_2, servo_pwm_config());
    let (servo_out, _) = servo_pwm.split();
    let servo = RcServo::for_sweep(unwrap!(servo_out), &config.sweep);

    // Dispenser motor: enable on PWM slice 2 A, direction on two GPIOs
    let motor_pwm = Pwm::new_output_a(p.PWM_SLICE2, p.PIN_4, motor_pwm_config());
    let (enable, _) = motor_pwm.split();
    let in1 = Output::new(p.PIN_6, Level::Low);
    let in2 = Output::new(p.PIN_7, Level::Low);
    let motor = HBridgeMotor::new(in1, in2, unwrap!(enable));
    info!("Servo and motor initialized");

    // HC-SR04
    let trigger = Output::new(p.PIN_8, Level::Low);
    let echo = Input::new(p.PIN_9, Pull::Down);

    // Operator inputs
    let switch = SlideSwitch::new(Input::new(p.PIN_10, Pull::Up));
    let button = Input::new(p.PIN_11, Pull::Up);
    let leds = [
        Output::new(p.PIN_12, Level::Low),
        Output::new(p.PIN_13, Level::Low),
    ];

    let board = Board {
        servo,
        motor,
        switch,
        leds,
        ranging: &RANGING,
    };

    // Spawn tasks
    spawner.spawn(tasks::telemetry_task(tx)).unwrap();
    spawner.spawn(tasks::echo_task(echo)).unwrap();
    spawner.spawn(tasks::button_task(button)).unwrap();
    spawner
        .spawn(tasks::dealer_task(config, board, trigger))
        .unwrap();

    info!("All tasks spawned, firmware running");

    loop {
        embassy_time::Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}
