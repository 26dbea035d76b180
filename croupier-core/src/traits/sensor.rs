//! Ranging sensor and switch traits

/// Control side of the ranging collaborator
///
/// Near/far detections reach the dealer as events; this trait only switches
/// detection on and off and exposes the latest readings for telemetry.
pub trait RangeSensor {
    /// Enable or disable near/far event generation
    fn set_ranging(&mut self, enabled: bool);

    /// Forget filter history and the current near/far zone
    fn reset_filter(&mut self);

    /// Latest unfiltered distance in cm
    fn raw_cm(&self) -> u16;

    /// Latest filtered distance in cm
    fn filtered_cm(&self) -> u16 {
        self.raw_cm()
    }
}

/// Power slide switch
///
/// Implementations return the raw level; the dealer debounces it.
pub trait SwitchInput {
    /// True if the switch is in the ON position
    fn switch_on(&mut self) -> bool;
}
