//! Card dealer state machine
//!
//! The dealer itself is pure: events in, commands out. [`DealerService`]
//! connects it to the scheduler and the board.

pub mod command;
pub mod debounce;
pub mod game;
pub mod machine;
pub mod players;
pub mod service;
pub mod sweep;

#[cfg(test)]
mod scenarios;

pub use command::{Command, Commands, MAX_COMMANDS};
pub use debounce::{SwitchDebounce, SwitchLevel};
pub use game::GameMode;
pub use machine::{
    CardDealer, Dispense, DispensePhase, State, MOTOR_TIMER, SWEEP_TIMER, WATCHDOG_TIMER,
};
pub use players::{Player, PlayerTable};
pub use service::DealerService;
pub use sweep::{crossed, Step, Sweep};
