//! Cooperative event scheduler
//!
//! Run-to-completion services with bounded per-service queues, fed by a bank
//! of one-shot countdown timers and by external event sources.

pub mod event;
pub mod framework;
pub mod timer;

pub use event::{Event, ServiceId, TimerId};
pub use framework::{
    Context, Framework, SchedulerError, Service, MAX_QUEUE_DEPTH, MAX_SERVICES,
};
pub use timer::{Expiry, TimerSubsystem, MAX_TIMERS};
