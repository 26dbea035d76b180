//! Embassy async tasks
//!
//! Each task runs independently and communicates via channels.

pub mod button;
pub mod dealer;
pub mod echo;
pub mod telemetry;

pub use button::button_task;
pub use dealer::dealer_task;
pub use echo::echo_task;
pub use telemetry::telemetry_task;
