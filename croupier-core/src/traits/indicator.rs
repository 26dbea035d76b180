//! Status outputs: mode LEDs and the telemetry stream

use croupier_protocol::Record;

use crate::state::GameMode;

/// Two LEDs showing the selected game
pub trait ModeIndicator {
    /// Light the pattern for `mode`, or turn both LEDs off for `None`
    fn show_mode(&mut self, mode: Option<GameMode>);
}

/// Destination for telemetry lines
///
/// Emitting must never fail from the dealer's point of view; a sink that
/// cannot keep up drops lines.
pub trait TelemetrySink {
    fn emit(&mut self, record: &Record<'_>);
}
