//! Side effects requested by the dealer
//!
//! The dealing state machine does not touch hardware or timers itself. Each
//! event produces an ordered list of commands which the dealer service then
//! carries out.

use croupier_protocol::Record;
use heapless::Vec;

use super::game::GameMode;
use crate::scheduler::TimerId;
use crate::traits::Direction;

/// Most commands a single event can produce
pub const MAX_COMMANDS: usize = 32;

/// One side effect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Arm (or restart) one of the dealer's timers
    ArmTimer(TimerId, u32),
    /// Disarm one of the dealer's timers
    CancelTimer(TimerId),
    /// Move the sweep servo (pulse width in µs)
    SetSweep(u16),
    /// Run the dispenser
    Drive(Direction, u8),
    /// Release the H-bridge
    Coast,
    /// Stop the dispenser
    StopMotor,
    /// Enable or disable near/far detection
    Ranging(bool),
    /// Clear ranging filter state
    ResetRanging,
    /// Show a game on the mode LEDs; `None` turns them off
    ShowMode(Option<GameMode>),
    /// Emit a distance sample using the latest readings
    SampleDistance,
    /// Emit a telemetry record
    Emit(Record<'static>),
}

/// Ordered command list for one event
pub type Commands = Vec<Command, MAX_COMMANDS>;
