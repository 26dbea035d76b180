//! End-to-end dealing runs on the scheduler with a simulated table
//!
//! The simulated board places players at fixed sweep positions. While
//! ranging is enabled it posts `ObjectNear`/`ObjectFar` to the dealer when
//! the servo moves into or out of a player's window, like the ultrasonic
//! classifier does on hardware.

use std::cell::RefCell;
use std::rc::Rc;
use std::string::{String, ToString};
use std::vec::Vec;

use croupier_protocol::Record;

use super::command::Command;
use super::game::GameMode;
use super::machine::{
    CardDealer, Dispense, DispensePhase, State, MOTOR_TIMER, SWEEP_TIMER, WATCHDOG_TIMER,
};
use super::service::DealerService;
use crate::config::DealerConfig;
use crate::scheduler::{Event, Framework, ServiceId};
use crate::traits::{
    Direction, DispenserMotor, ModeIndicator, RangeSensor, SweepServo, SwitchInput,
    TelemetrySink,
};

/// Width of the zone in which a player reads as near (µs of pulse)
const NEAR_WINDOW_US: u16 = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Motor {
    Stopped,
    Coasting,
    Driving(Direction, u8),
}

struct Table {
    seats: Vec<u16>,
    pulse_us: u16,
    motor: Motor,
    ranging: bool,
    near: bool,
    switch_on: bool,
    mode: Option<GameMode>,
    lines: Vec<String>,
    ejects: usize,
}

impl Table {
    fn new(seats: &[u16]) -> Self {
        Self {
            seats: seats.to_vec(),
            pulse_us: 0,
            motor: Motor::Stopped,
            ranging: false,
            near: false,
            switch_on: false,
            mode: None,
            lines: Vec::new(),
            ejects: 0,
        }
    }

    fn someone_near(&self) -> bool {
        self.seats
            .iter()
            .any(|&seat| self.pulse_us >= seat && self.pulse_us < seat + NEAR_WINDOW_US)
    }

    fn distance_cm(&self) -> u16 {
        if self.someone_near() {
            20
        } else {
            150
        }
    }

    fn saw(&self, line: &str) -> bool {
        self.lines.iter().any(|l| l == line)
    }

    fn count(&self, line: &str) -> usize {
        self.lines.iter().filter(|l| *l == line).count()
    }
}

#[derive(Clone)]
struct Board(Rc<RefCell<Table>>);

impl SweepServo for Board {
    fn set_pulse_us(&mut self, pulse_us: u16) {
        self.0.borrow_mut().pulse_us = pulse_us;
    }
}

impl DispenserMotor for Board {
    fn drive(&mut self, direction: Direction, duty_pct: u8) {
        let mut table = self.0.borrow_mut();
        if direction == Direction::Reverse {
            table.ejects += 1;
        }
        table.motor = Motor::Driving(direction, duty_pct);
    }

    fn coast(&mut self) {
        self.0.borrow_mut().motor = Motor::Coasting;
    }

    fn stop_motor(&mut self) {
        self.0.borrow_mut().motor = Motor::Stopped;
    }
}

impl RangeSensor for Board {
    fn set_ranging(&mut self, enabled: bool) {
        self.0.borrow_mut().ranging = enabled;
    }

    fn reset_filter(&mut self) {
        self.0.borrow_mut().near = false;
    }

    fn raw_cm(&self) -> u16 {
        self.0.borrow().distance_cm()
    }
}

impl SwitchInput for Board {
    fn switch_on(&mut self) -> bool {
        self.0.borrow().switch_on
    }
}

impl ModeIndicator for Board {
    fn show_mode(&mut self, mode: Option<GameMode>) {
        self.0.borrow_mut().mode = mode;
    }
}

impl TelemetrySink for Board {
    fn emit(&mut self, record: &Record<'_>) {
        self.0.borrow_mut().lines.push(record.to_string());
    }
}

/// Advance the scheduler and the simulated table by one millisecond
fn step(framework: &mut Framework<'_>, dealer: ServiceId, table: &Rc<RefCell<Table>>) {
    framework.tick(1);
    while framework.run_once() {}

    // Ranging classifier: report zone changes only
    let event = {
        let mut t = table.borrow_mut();
        let near = t.ranging && t.someone_near();
        if near != t.near {
            t.near = near;
            Some(if near { Event::ObjectNear } else { Event::ObjectFar })
        } else {
            None
        }
    };
    if let Some(event) = event {
        framework.post_to(dealer, event).unwrap();
        while framework.run_once() {}
    }
}

fn run_for(framework: &mut Framework<'_>, dealer: ServiceId, table: &Rc<RefCell<Table>>, ms: u32) {
    for _ in 0..ms {
        step(framework, dealer, table);
    }
}

/// Run one millisecond at a time until `done` holds; returns the time taken
fn run_until(
    framework: &mut Framework<'_>,
    dealer: ServiceId,
    table: &Rc<RefCell<Table>>,
    limit_ms: u32,
    mut done: impl FnMut(&Table) -> bool,
) -> u32 {
    for elapsed in 1..=limit_ms {
        step(framework, dealer, table);
        if done(&table.borrow()) {
            return elapsed;
        }
    }
    panic!("condition not reached within {} ms", limit_ms);
}

fn rig(seats: &[u16]) -> (Rc<RefCell<Table>>, DealerService<Board>) {
    let table = Rc::new(RefCell::new(Table::new(seats)));
    let service = DealerService::new(DealerConfig::default(), Board(table.clone()));
    (table, service)
}

fn select_mode_and_switch_on(
    framework: &mut Framework<'_>,
    dealer: ServiceId,
    table: &Rc<RefCell<Table>>,
    mode: GameMode,
) {
    framework.initialize_all();
    run_for(framework, dealer, table, 200);
    framework.post_to(dealer, Event::ModeButton(mode.index())).unwrap();
    run_until(framework, dealer, table, 200, |t| t.mode == Some(mode));
    table.borrow_mut().switch_on = true;
}

#[test]
fn test_calibration_leaves_quota_minus_one() {
    let (table, mut service) = rig(&[1800, 1200]);
    {
        let mut framework = Framework::new();
        let dealer = framework.register(&mut service, 0, 8).unwrap();
        select_mode_and_switch_on(&mut framework, dealer, &table, GameMode::FiveCardDraw);
        run_until(&mut framework, dealer, &table, 30_000, |t| t.saw(",,HSM=SWEEP"));
    }

    let table = table.borrow();
    assert!(table.saw(",,GAME=FiveCardDraw"));
    assert!(table.saw(",,PLAYER1=1200"));
    assert!(table.saw(",,PLAYER2=1800"));
    assert_eq!(table.count(",,CAL_DEAL_PULSE=1200"), 1);
    assert_eq!(table.count(",,CAL_DEAL_PULSE=1800"), 1);
    assert_eq!(table.ejects, 2);
    assert!(!table.ranging);

    let dealer = service.dealer();
    assert_eq!(dealer.state(), State::DealSweep);
    let players: Vec<(u16, u8)> = dealer
        .players()
        .iter()
        .map(|p| (p.angle_us, p.remaining))
        .collect();
    assert_eq!(players, [(1200, 4), (1800, 4)]);
    assert_eq!(dealer.players().total_remaining(), 2 * (5 - 1));
    assert_eq!(dealer.sweep().position(), 1000);
}

#[test]
fn test_full_five_card_deal() {
    let (table, mut service) = rig(&[1200, 1800]);
    {
        let mut framework = Framework::new();
        let dealer = framework.register(&mut service, 0, 8).unwrap();
        select_mode_and_switch_on(&mut framework, dealer, &table, GameMode::FiveCardDraw);
        run_until(&mut framework, dealer, &table, 120_000, |t| t.saw(",,HSM=DONE"));

        // Done keeps the heartbeat alive and never dispenses again
        run_for(&mut framework, dealer, &table, 10_000);
        assert!(framework.timers().is_armed(WATCHDOG_TIMER));
    }

    let table = table.borrow();
    // Two calibration cards plus eight dealt cards
    assert_eq!(table.ejects, 10);
    assert_eq!(table.count(",,DEAL_PULSE=1200"), 4);
    assert_eq!(table.count(",,DEAL_PULSE=1800"), 4);

    // Alternates between players, lowest angle first
    let left: Vec<&str> = table
        .lines
        .iter()
        .filter(|l| l.contains("_LEFT="))
        .map(|l| l.as_str())
        .collect();
    assert_eq!(
        left,
        [
            ",,P1_LEFT=3",
            ",,P2_LEFT=3",
            ",,P1_LEFT=2",
            ",,P2_LEFT=2",
            ",,P1_LEFT=1",
            ",,P2_LEFT=1",
            ",,P1_LEFT=0",
            ",,P2_LEFT=0",
        ]
    );

    // The watchdog never fired once the deal started
    let started = table.lines.iter().position(|l| l == ",,HSM=CAL").unwrap();
    assert!(!table.lines[started..].iter().any(|l| l == ",,HSM=IDLE"));
    assert_eq!(table.motor, Motor::Stopped);

    let dealer = service.dealer();
    assert_eq!(dealer.state(), State::Done);
    assert!(dealer.players().all_dealt());
}

#[test]
fn test_no_players_returns_to_idle() {
    let (table, mut service) = rig(&[]);
    {
        let mut framework = Framework::new();
        let dealer = framework.register(&mut service, 0, 8).unwrap();
        select_mode_and_switch_on(&mut framework, dealer, &table, GameMode::Blackjack);
        run_until(&mut framework, dealer, &table, 1000, |t| t.saw(",,HSM=CAL"));
        let idle = table.borrow().count(",,HSM=IDLE");
        run_until(&mut framework, dealer, &table, 10_000, |t| t.count(",,HSM=IDLE") > idle);
        // Let the reset tuck finish
        run_until(&mut framework, dealer, &table, 500, |t| t.motor == Motor::Stopped);
    }

    let table = table.borrow();
    assert_eq!(table.ejects, 0);
    assert!(!table.saw(",,HSM=FDEAL"));
    assert!(!table.saw(",,HSM=SWEEP"));
    assert!(!table.ranging);
    assert_eq!(table.pulse_us, 1000);
    assert_eq!(service.dealer().state(), State::Idle);
}

#[test]
fn test_switch_off_during_deal_resets() {
    let (table, mut service) = rig(&[1500]);
    {
        let mut framework = Framework::new();
        let dealer = framework.register(&mut service, 0, 8).unwrap();
        select_mode_and_switch_on(&mut framework, dealer, &table, GameMode::GoFish);
        run_until(&mut framework, dealer, &table, 30_000, |t| {
            t.motor == Motor::Driving(Direction::Reverse, 100)
        });

        let idle = table.borrow().count(",,HSM=IDLE");
        let ejects = table.borrow().ejects;
        table.borrow_mut().switch_on = false;

        // Eight samples, one per pass: well inside the 350 ms eject
        let latency = run_until(&mut framework, dealer, &table, 5_000, |t| {
            t.count(",,HSM=IDLE") > idle
        });
        assert!(latency <= 8, "idle after {} ms", latency);
        assert!(!table.borrow().ranging);
        assert_eq!(table.borrow().motor, Motor::Driving(Direction::Forward, 100));
        assert!(matches!(framework.timers().remaining_ms(MOTOR_TIMER), Some(ms) if ms <= 100));
        assert_eq!(table.borrow().ejects, ejects);

        run_until(&mut framework, dealer, &table, 500, |t| t.motor == Motor::Stopped);
        assert!(!framework.timers().is_armed(MOTOR_TIMER));

        // Nothing else is dealt while the switch stays off
        run_for(&mut framework, dealer, &table, 10_000);
        assert_eq!(table.borrow().ejects, ejects);
        assert!(framework.timers().is_armed(WATCHDOG_TIMER));
    }
    assert_eq!(service.dealer().state(), State::Idle);
    assert_eq!(table.borrow().pulse_us, 1000);
    // The interrupted card is still owed
    assert_eq!(service.dealer().players().remaining(0), GameMode::GoFish.quota());
}

#[test]
fn test_switch_off_edge_cancels_motor_timer() {
    let mut dealer = CardDealer::new(DealerConfig::default(), true);
    dealer.init();
    dealer.sample_switch(true);
    for _ in 0..10 {
        dealer.handle(Event::Timeout(SWEEP_TIMER));
    }
    dealer.handle(Event::ObjectNear);
    dealer.handle(Event::Timeout(MOTOR_TIMER));
    dealer.handle(Event::Timeout(MOTOR_TIMER));
    assert_eq!(
        dealer.state(),
        State::Calibrating(Dispense {
            phase: DispensePhase::Eject,
            player: 0
        })
    );

    for _ in 0..7 {
        assert!(dealer.sample_switch(false).is_empty());
        assert!(dealer.state().is_dispensing());
    }
    let out = dealer.sample_switch(false);
    assert_eq!(dealer.state(), State::Idle);

    let stop = out.iter().position(|c| *c == Command::StopMotor).unwrap();
    let cancel = out
        .iter()
        .position(|c| *c == Command::CancelTimer(MOTOR_TIMER))
        .unwrap();
    let tuck = out
        .iter()
        .position(|c| matches!(c, Command::Drive(Direction::Forward, _)))
        .unwrap();
    assert_eq!(stop, 0);
    assert!(cancel < tuck);
    // The card was never dealt
    assert_eq!(dealer.players().remaining(0), GameMode::Blackjack.quota());

    // The late eject timeout now only ends the tuck
    let out = dealer.handle(Event::Timeout(MOTOR_TIMER));
    assert_eq!(out.as_slice(), &[Command::StopMotor]);
    assert_eq!(dealer.state(), State::Idle);
}

#[test]
fn test_reset_is_idempotent() {
    let mut dealer = CardDealer::new(DealerConfig::default(), false);
    dealer.init();
    dealer.sample_switch(false);

    let first = dealer.handle(Event::Timeout(WATCHDOG_TIMER));
    let snapshot = dealer.clone();
    let second = dealer.handle(Event::Timeout(WATCHDOG_TIMER));

    assert_eq!(first, second);
    assert_eq!(dealer.state(), snapshot.state());
    assert_eq!(dealer.sweep(), snapshot.sweep());
    assert_eq!(dealer.players(), snapshot.players());
}

#[test]
fn test_max_players_ends_calibration_early() {
    let (table, mut service) = rig(&[1300, 1500, 1700, 1900, 2100]);
    {
        let mut framework = Framework::new();
        let dealer = framework.register(&mut service, 0, 8).unwrap();
        select_mode_and_switch_on(&mut framework, dealer, &table, GameMode::Blackjack);
        run_until(&mut framework, dealer, &table, 30_000, |t| t.saw(",,HSM=SWEEP"));
    }

    let table = table.borrow();
    assert!(table.saw(",,PLAYER4=1900"));
    assert!(!table.saw(",,PLAYER5=2100"));
    assert_eq!(table.ejects, 4);
    let dealer = service.dealer();
    assert_eq!(dealer.players().len(), 4);
    assert_eq!(dealer.players().total_remaining(), 4);
}

#[test]
fn test_watchdog_recovers_stalled_sweep() {
    let (table, mut service) = rig(&[]);
    let watchdog_ms = DealerConfig::default().watchdog_ms;
    {
        let mut framework = Framework::new();
        let dealer = framework.register(&mut service, 0, 2).unwrap();
        framework.initialize_all();
        run_for(&mut framework, dealer, &table, 200);
        table.borrow_mut().switch_on = true;
        run_until(&mut framework, dealer, &table, 1000, |t| t.saw(",,HSM=CAL"));
        run_for(&mut framework, dealer, &table, 300);

        while framework.timers().remaining_ms(SWEEP_TIMER) != Some(1) {
            step(&mut framework, dealer, &table);
        }
        // A full queue swallows the next sweep step
        framework.post_to(dealer, Event::NoEvent).unwrap();
        framework.post_to(dealer, Event::NoEvent).unwrap();
        assert_eq!(framework.tick(1), 1);
        while framework.run_once() {}
        assert!(!framework.timers().is_armed(SWEEP_TIMER));
        assert!(framework.timers().is_armed(WATCHDOG_TIMER));

        let idle = table.borrow().count(",,HSM=IDLE");
        let recovery = run_until(&mut framework, dealer, &table, 2 * watchdog_ms, |t| {
            t.count(",,HSM=IDLE") > idle
        });
        assert!(recovery <= watchdog_ms, "idle after {} ms", recovery);
        assert!(framework.timers().is_armed(SWEEP_TIMER));
    }

    let table = table.borrow();
    assert!(!table.ranging);
    assert_eq!(table.pulse_us, 1000);
    assert_eq!(table.ejects, 0);
    assert_eq!(service.dealer().state(), State::Idle);
}
