//! Card dealer state machine
//!
//! All servo, motor and ranging behavior is a function of the current state
//! and an event. The switch is debounced separately, one raw reading per
//! scheduler pass, and its edges override whatever state the dealer is in.
//! Every event first goes through the global rules (watchdog, mode button)
//! and then through the handler for the current state. The result is the
//! list of commands to carry out.

use croupier_protocol::{PhaseTag, Record};

use super::command::{Command, Commands};
use super::debounce::{SwitchDebounce, SwitchLevel};
use super::game::GameMode;
use super::players::PlayerTable;
use super::sweep::Sweep;
use crate::config::DealerConfig;
use crate::scheduler::{Event, TimerId};
use crate::traits::Direction;

/// Sweep step timer; doubles as the heartbeat while idle or done
pub const SWEEP_TIMER: TimerId = TimerId(1);
/// Dispense sequence and tuck timer
pub const MOTOR_TIMER: TimerId = TimerId(2);
/// Stall watchdog
pub const WATCHDOG_TIMER: TimerId = TimerId(3);

/// Step of the card dispense sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DispensePhase {
    /// Sweep stopped, letting the servo settle
    Settle,
    /// Bridge released before the reversal
    Coast,
    /// Reverse run throwing the card
    Eject,
    /// Forward run tucking the next card back
    Lock,
}

/// A dispense in progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Dispense {
    pub phase: DispensePhase,
    /// Index into the player table
    pub player: u8,
}

impl Dispense {
    fn settle(player: usize) -> Self {
        Self {
            phase: DispensePhase::Settle,
            player: player as u8,
        }
    }
}

/// Dealer states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    /// Switch off; sweep parked, motor stopped, ranging off
    Idle,
    /// Sweeping with ranging on, collecting players
    CalibrationSweep,
    /// Dealing the first card to a player just found
    Calibrating(Dispense),
    /// Sweeping toward the current player's angle
    DealSweep,
    /// Dealing one card to the current player
    Dealing(Dispense),
    /// Tucking cards at the sweep wraparound
    BoundaryNudge,
    /// Every player has their cards
    Done,
}

impl State {
    /// Check if a card is being dealt
    pub fn is_dispensing(&self) -> bool {
        matches!(self, State::Calibrating(_) | State::Dealing(_))
    }

    /// Check if the sweep timer drives this state
    pub fn is_sweeping(&self) -> bool {
        matches!(self, State::CalibrationSweep | State::DealSweep)
    }

    /// Telemetry tag for this state
    pub fn phase_tag(&self) -> PhaseTag {
        match self {
            State::Idle => PhaseTag::Idle,
            State::CalibrationSweep => PhaseTag::Calibrating,
            State::Calibrating(_) => PhaseTag::CalibrationDeal,
            State::DealSweep | State::BoundaryNudge => PhaseTag::Sweeping,
            State::Dealing(Dispense {
                phase: DispensePhase::Settle,
                ..
            }) => PhaseTag::Delay,
            State::Dealing(_) => PhaseTag::Dealing,
            State::Done => PhaseTag::Done,
        }
    }
}

fn push(out: &mut Commands, command: Command) {
    // MAX_COMMANDS covers the longest event path
    let _ = out.push(command);
}

/// The card dealer
#[derive(Debug, Clone)]
pub struct CardDealer {
    config: DealerConfig,
    state: State,
    mode: GameMode,
    sweep: Sweep,
    players: PlayerTable,
    /// Player the deal sweep is heading for
    current: usize,
    switch: SwitchDebounce,
}

impl CardDealer {
    /// Create a dealer; `switch_on` is the raw switch level at power-up
    pub fn new(config: DealerConfig, switch_on: bool) -> Self {
        Self {
            sweep: Sweep::new(&config.sweep),
            config,
            state: State::Idle,
            mode: GameMode::default(),
            players: PlayerTable::new(),
            current: 0,
            switch: SwitchDebounce::new(switch_on),
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn players(&self) -> &PlayerTable {
        &self.players
    }

    /// Index of the player the next card goes to
    pub fn current_player(&self) -> usize {
        self.current
    }

    pub fn sweep(&self) -> &Sweep {
        &self.sweep
    }

    pub fn config(&self) -> &DealerConfig {
        &self.config
    }

    /// Power-up: write the telemetry header and park everything
    pub fn init(&mut self) -> Commands {
        let mut out = Commands::new();
        push(&mut out, Command::Emit(Record::Header));
        self.reset_to_idle(&mut out);
        out
    }

    /// Shift one raw switch reading into the debouncer
    ///
    /// Called once per scheduler pass. A settled OFF edge forces idle from
    /// any state; a settled ON edge while idle starts calibration.
    pub fn sample_switch(&mut self, switch_on: bool) -> Commands {
        let mut out = Commands::new();
        match self.switch.sample(switch_on) {
            Some(SwitchLevel::Off) => self.reset_to_idle(&mut out),
            Some(SwitchLevel::On) if self.state == State::Idle => {
                self.start_calibration(&mut out)
            }
            _ => {}
        }
        out
    }

    /// Process one event
    pub fn handle(&mut self, event: Event) -> Commands {
        let mut out = Commands::new();

        if event.is_timeout(WATCHDOG_TIMER) {
            self.reset_to_idle(&mut out);
            return out;
        }

        if let Event::ModeButton(index) = event {
            if self.state == State::Idle {
                if let Some(mode) = GameMode::from_index(index) {
                    self.mode = mode;
                    push(&mut out, Command::ShowMode(Some(mode)));
                    push(&mut out, Command::Emit(Record::Game(mode.name())));
                }
            }
            return out;
        }

        match (self.state, event) {
            (State::Idle, Event::Timeout(SWEEP_TIMER)) | (State::Done, Event::Timeout(SWEEP_TIMER)) => {
                self.arm_heartbeat(&mut out);
                self.kick_watchdog(&mut out);
            }
            // End of the reset tuck
            (State::Idle, Event::Timeout(MOTOR_TIMER)) => push(&mut out, Command::StopMotor),

            (State::CalibrationSweep, Event::Timeout(SWEEP_TIMER)) => {
                self.calibration_step(&mut out)
            }
            (State::CalibrationSweep, Event::ObjectNear) => self.capture_player(&mut out),

            (State::Calibrating(dispense), Event::Timeout(MOTOR_TIMER)) => {
                self.advance_dispense(dispense, true, &mut out)
            }

            (State::DealSweep, Event::Timeout(SWEEP_TIMER)) => self.deal_step(&mut out),

            (State::Dealing(dispense), Event::Timeout(MOTOR_TIMER)) => {
                self.advance_dispense(dispense, false, &mut out)
            }

            (State::BoundaryNudge, Event::Timeout(MOTOR_TIMER)) => self.finish_nudge(&mut out),

            _ => {}
        }

        out
    }

    fn arm_heartbeat(&self, out: &mut Commands) {
        push(out, Command::ArmTimer(SWEEP_TIMER, self.config.sweep.step_ms));
    }

    fn kick_watchdog(&self, out: &mut Commands) {
        push(out, Command::ArmTimer(WATCHDOG_TIMER, self.config.watchdog_ms));
    }

    fn drive_fast(&self, direction: Direction, out: &mut Commands) {
        push(
            out,
            Command::Drive(direction, self.config.dispense.fast_duty_pct),
        );
    }

    fn enter(&mut self, state: State, out: &mut Commands) {
        self.state = state;
        push(out, Command::Emit(Record::Phase(state.phase_tag())));
    }

    /// Stop everything, park the sweep and tuck the cards
    fn reset_to_idle(&mut self, out: &mut Commands) {
        push(out, Command::StopMotor);
        push(out, Command::Ranging(false));
        push(out, Command::ResetRanging);
        push(out, Command::CancelTimer(MOTOR_TIMER));

        let park = self.sweep.park();
        push(out, Command::SetSweep(park));

        self.drive_fast(Direction::Forward, out);
        push(out, Command::ArmTimer(MOTOR_TIMER, self.config.dispense.nudge_ms));

        self.arm_heartbeat(out);
        self.kick_watchdog(out);
        push(out, Command::ShowMode(None));
        self.current = 0;
        self.enter(State::Idle, out);
    }

    fn start_calibration(&mut self, out: &mut Commands) {
        self.players.clear();
        self.current = 0;

        // The reset tuck may still be running
        push(out, Command::CancelTimer(MOTOR_TIMER));
        push(out, Command::StopMotor);

        let park = self.sweep.park();
        push(out, Command::SetSweep(park));
        self.sweep.start_warmup(self.config.sweep.warmup_steps);

        push(out, Command::ResetRanging);
        push(out, Command::Ranging(true));
        push(out, Command::Emit(Record::Game(self.mode.name())));

        self.arm_heartbeat(out);
        self.kick_watchdog(out);
        self.enter(State::CalibrationSweep, out);
    }

    fn calibration_step(&mut self, out: &mut Commands) {
        let step = self.sweep.step();
        push(out, Command::SetSweep(step.position));
        if !step.wrapped {
            push(out, Command::SampleDistance);
        }
        self.kick_watchdog(out);

        if self.sweep.tick_warmup() {
            push(out, Command::Emit(Record::Ready));
        }

        if self.sweep.warmed_up() && (step.wrapped || self.players.is_full()) {
            self.finish_calibration(out);
        } else {
            self.arm_heartbeat(out);
        }
    }

    fn capture_player(&mut self, out: &mut Commands) {
        if !self.sweep.warmed_up() || self.players.is_full() {
            return;
        }

        let angle = self.sweep.position();
        if !self
            .players
            .is_new_player(angle, self.config.detection.min_separation_us)
        {
            return;
        }
        let Some(index) = self.players.add(angle, self.mode.quota()) else {
            return;
        };

        push(
            out,
            Command::Emit(Record::Player {
                number: index as u8 + 1,
                pulse_us: angle,
            }),
        );
        push(out, Command::CancelTimer(SWEEP_TIMER));
        push(
            out,
            Command::ArmTimer(MOTOR_TIMER, self.config.dispense.settle_ms),
        );
        self.current = index;
        self.state = State::Calibrating(Dispense::settle(index));
    }

    fn finish_calibration(&mut self, out: &mut Commands) {
        push(out, Command::Ranging(false));

        if self.players.is_empty() {
            self.reset_to_idle(out);
            return;
        }

        // One card each was dealt on discovery
        self.players.sort_by_angle();
        self.players
            .set_all_remaining(self.mode.quota().saturating_sub(1));
        self.current = 0;

        let park = self.sweep.park();
        push(out, Command::SetSweep(park));

        self.arm_heartbeat(out);
        self.kick_watchdog(out);
        if self.players.all_dealt() {
            self.enter(State::Done, out);
        } else {
            self.enter(State::DealSweep, out);
        }
    }

    fn deal_step(&mut self, out: &mut Commands) {
        let step = self.sweep.step();
        push(out, Command::SetSweep(step.position));
        self.kick_watchdog(out);

        if step.wrapped {
            self.drive_fast(Direction::Forward, out);
            push(out, Command::ArmTimer(MOTOR_TIMER, self.config.dispense.nudge_ms));
            self.state = State::BoundaryNudge;
            return;
        }

        push(out, Command::SampleDistance);
        if self.current_pending(|sweep, angle| sweep.passed(angle)) {
            self.begin_deal(out);
        } else {
            self.arm_heartbeat(out);
        }
    }

    fn finish_nudge(&mut self, out: &mut Commands) {
        push(out, Command::StopMotor);

        if self.current_pending(|sweep, angle| sweep.reached(angle)) {
            self.kick_watchdog(out);
            self.begin_deal(out);
        } else {
            self.arm_heartbeat(out);
            self.kick_watchdog(out);
            self.enter(State::DealSweep, out);
        }
    }

    /// Is the current player owed a card and does `at_player` hold for them?
    fn current_pending(&self, at_player: impl Fn(&Sweep, u16) -> bool) -> bool {
        self.players.remaining(self.current) > 0
            && self
                .players
                .angle(self.current)
                .is_some_and(|angle| at_player(&self.sweep, angle))
    }

    fn begin_deal(&mut self, out: &mut Commands) {
        push(
            out,
            Command::ArmTimer(MOTOR_TIMER, self.config.dispense.settle_ms),
        );
        self.enter(State::Dealing(Dispense::settle(self.current)), out);
    }

    fn advance_dispense(&mut self, dispense: Dispense, calibration: bool, out: &mut Commands) {
        let timing = self.config.dispense;
        let wrap = |phase| {
            let next = Dispense { phase, ..dispense };
            if calibration {
                State::Calibrating(next)
            } else {
                State::Dealing(next)
            }
        };

        match dispense.phase {
            DispensePhase::Settle => {
                push(
                    out,
                    Command::Emit(Record::DealPulse {
                        pulse_us: self.sweep.position(),
                        calibration,
                    }),
                );
                push(out, Command::Coast);
                push(out, Command::ArmTimer(MOTOR_TIMER, timing.coast_ms));
                self.state = wrap(DispensePhase::Coast);
            }
            DispensePhase::Coast => {
                self.drive_fast(Direction::Reverse, out);
                push(out, Command::ArmTimer(MOTOR_TIMER, timing.eject_ms));
                self.enter(wrap(DispensePhase::Eject), out);
            }
            DispensePhase::Eject => {
                self.drive_fast(Direction::Forward, out);
                push(out, Command::ArmTimer(MOTOR_TIMER, timing.lock_ms));
                self.state = wrap(DispensePhase::Lock);
            }
            DispensePhase::Lock => {
                push(out, Command::StopMotor);
                let player = dispense.player as usize;
                let left = self.players.take_card(player);

                if calibration {
                    self.arm_heartbeat(out);
                    self.kick_watchdog(out);
                    self.enter(State::CalibrationSweep, out);
                    return;
                }

                push(
                    out,
                    Command::Emit(Record::Remaining {
                        number: dispense.player + 1,
                        left,
                    }),
                );
                self.arm_heartbeat(out);
                self.kick_watchdog(out);
                match self.players.next_pending(player) {
                    Some(next) => {
                        self.current = next;
                        self.enter(State::DealSweep, out);
                    }
                    None => self.enter(State::Done, out),
                }
            }
        }
    }
}
