//! Sweep servo trait

/// RC servo that points the ranging sensor
///
/// Position is expressed directly as a pulse width, which is also the unit
/// the dealer remembers player positions in.
pub trait SweepServo {
    /// Command a new pulse width in microseconds
    fn set_pulse_us(&mut self, pulse_us: u16);
}
