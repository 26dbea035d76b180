//! Inter-task communication channels
//!
//! Defines the static channels used for communication between Embassy tasks.
//! Uses embassy-sync primitives for safe async communication.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use heapless::String;
use portable_atomic::AtomicU32;

use croupier_core::scheduler::Event;
use croupier_drivers::sensor::SharedRanging;
use croupier_protocol::MAX_LINE_LEN;

/// Channel capacity for events headed to the scheduler
const EVENT_CHANNEL_SIZE: usize = 8;

/// Channel capacity for outgoing telemetry lines
const TELEMETRY_CHANNEL_SIZE: usize = 16;

/// One encoded telemetry line, terminator included
pub type TelemetryLine = String<MAX_LINE_LEN>;

/// Events from the input and echo tasks to the dealer loop
pub static DEALER_EVENTS: Channel<CriticalSectionRawMutex, Event, EVENT_CHANNEL_SIZE> =
    Channel::new();

/// Telemetry lines from the dealer loop to the UART
pub static TELEMETRY: Channel<CriticalSectionRawMutex, TelemetryLine, TELEMETRY_CHANNEL_SIZE> =
    Channel::new();

/// Telemetry lines dropped because the UART fell behind
pub static DROPPED_LINES: AtomicU32 = AtomicU32::new(0);

/// Latest distance readings and the ranging enable flag
pub static RANGING: SharedRanging = SharedRanging::new();
