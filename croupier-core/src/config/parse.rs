//! Minimal TOML parser for dealer configuration
//!
//! Handles only the subset the dealer needs, not full TOML.
//!
//! Supported features:
//! - `key = integer` pairs (underscores allowed as digit separators)
//! - `[sweep]`, `[dispense]` and `[detection]` section headers
//! - Comments (`# ...`), including trailing comments
//!
//! Keys that are not present keep their default value. Unknown sections and
//! keys are rejected so that a typo cannot silently fall back to a default.

use super::types::DealerConfig;

/// What went wrong while parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseErrorKind {
    /// Malformed `[section]` header
    InvalidSection,
    /// Section name is not one the dealer knows
    UnknownSection,
    /// Line is not a `key = value` pair
    InvalidLine,
    /// Key is not valid in the current section
    UnknownKey,
    /// Value is not an integer or does not fit the field
    InvalidValue,
}

/// Parse error with the 1-based line it occurred on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ParseError {
    pub line: usize,
    pub kind: ParseErrorKind,
}

/// Current parsing context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Sweep,
    Dispense,
    Detection,
}

/// Parse TOML text into a `DealerConfig`, starting from defaults
///
/// The result is not validated; call [`DealerConfig::validate`] afterwards.
pub fn parse_config(input: &str) -> Result<DealerConfig, ParseError> {
    let mut config = DealerConfig::default();
    let mut section = Section::Root;

    for (index, line) in input.lines().enumerate() {
        let fail = |kind| ParseError {
            line: index + 1,
            kind,
        };

        // Strip comments
        let line = match line.find('#') {
            Some(pos) => &line[..pos],
            None => line,
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if line.starts_with('[') {
            let name = line
                .strip_prefix('[')
                .and_then(|rest| rest.strip_suffix(']'))
                .map(str::trim)
                .ok_or(fail(ParseErrorKind::InvalidSection))?;
            section = parse_section_header(name).map_err(fail)?;
            continue;
        }

        let (key, value) = line
            .split_once('=')
            .ok_or(fail(ParseErrorKind::InvalidLine))?;
        let key = key.trim();
        let value = parse_integer(value.trim()).ok_or(fail(ParseErrorKind::InvalidValue))?;

        apply_key(&mut config, section, key, value).map_err(fail)?;
    }

    Ok(config)
}

fn parse_section_header(name: &str) -> Result<Section, ParseErrorKind> {
    if name.is_empty() {
        return Err(ParseErrorKind::InvalidSection);
    }
    match name {
        "sweep" => Ok(Section::Sweep),
        "dispense" => Ok(Section::Dispense),
        "detection" => Ok(Section::Detection),
        _ => Err(ParseErrorKind::UnknownSection),
    }
}

fn parse_integer(text: &str) -> Option<u64> {
    if text.is_empty() || text.starts_with('_') || text.ends_with('_') {
        return None;
    }
    let mut value: u64 = 0;
    for c in text.chars().filter(|&c| c != '_') {
        let digit = c.to_digit(10)?;
        value = value.checked_mul(10)?.checked_add(digit as u64)?;
    }
    Some(value)
}

fn narrow<T: TryFrom<u64>>(value: u64) -> Result<T, ParseErrorKind> {
    T::try_from(value).map_err(|_| ParseErrorKind::InvalidValue)
}

fn apply_key(
    config: &mut DealerConfig,
    section: Section,
    key: &str,
    value: u64,
) -> Result<(), ParseErrorKind> {
    match (section, key) {
        (Section::Root, "watchdog_ms") => config.watchdog_ms = narrow(value)?,

        (Section::Sweep, "min_pulse_us") => config.sweep.min_pulse_us = narrow(value)?,
        (Section::Sweep, "max_pulse_us") => config.sweep.max_pulse_us = narrow(value)?,
        (Section::Sweep, "step_us") => config.sweep.step_us = narrow(value)?,
        (Section::Sweep, "step_ms") => config.sweep.step_ms = narrow(value)?,
        (Section::Sweep, "warmup_steps") => config.sweep.warmup_steps = narrow(value)?,

        (Section::Dispense, "settle_ms") => config.dispense.settle_ms = narrow(value)?,
        (Section::Dispense, "coast_ms") => config.dispense.coast_ms = narrow(value)?,
        (Section::Dispense, "eject_ms") => config.dispense.eject_ms = narrow(value)?,
        (Section::Dispense, "lock_ms") => config.dispense.lock_ms = narrow(value)?,
        (Section::Dispense, "nudge_ms") => config.dispense.nudge_ms = narrow(value)?,
        (Section::Dispense, "fast_duty_pct") => config.dispense.fast_duty_pct = narrow(value)?,

        (Section::Detection, "min_separation_us") => {
            config.detection.min_separation_us = narrow(value)?
        }

        _ => return Err(ParseErrorKind::UnknownKey),
    }
    Ok(())
}
