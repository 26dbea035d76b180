//! Telemetry records and their CSV line encoding.
//!
//! Line format (three columns, `\r\n` terminated):
//! - Header: `raw_cm,filt_cm,event`
//! - Distance sample: `<raw>,<filtered>,`
//! - Event: `,,<TEXT>`
//!
//! Event TEXT is one of `HSM=<tag>`, `GAME=<name>`, `READY`,
//! `PLAYER<n>=<pulse>`, `CAL_DEAL_PULSE=<pulse>`, `DEAL_PULSE=<pulse>` or
//! `P<n>_LEFT=<count>`. Player numbers are 1-based.

use core::fmt::{self, Write};

use heapless::String;

use crate::phase::PhaseTag;

/// Column header written once at boot
pub const CSV_HEADER: &str = "raw_cm,filt_cm,event";

/// Maximum encoded line length, including the trailing `\r\n`
pub const MAX_LINE_LEN: usize = 48;

const LINE_END: &str = "\r\n";

/// Errors that can occur while encoding or parsing a telemetry line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RecordError {
    /// Line is empty
    Empty,
    /// Line does not have three columns
    MissingField,
    /// A numeric field failed to parse
    InvalidNumber,
    /// Event text is not recognized
    UnknownEvent,
    /// Encoded line does not fit in `MAX_LINE_LEN`
    LineTooLong,
}

/// A single telemetry line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Record<'a> {
    /// Column header
    Header,
    /// Ranging sample taken on a sweep step
    Sample {
        /// Unfiltered distance in cm
        raw_cm: u16,
        /// Filtered distance in cm
        filtered_cm: u16,
    },
    /// Dealer entered a new phase
    Phase(PhaseTag),
    /// Selected game, by display name
    Game(&'a str),
    /// Calibration warm-up finished; detections are now accepted
    Ready,
    /// Player found during calibration
    Player {
        /// 1-based player number
        number: u8,
        /// Sweep pulse width where the player was seen (µs)
        pulse_us: u16,
    },
    /// Card ejected at this sweep position
    DealPulse {
        /// Sweep pulse width (µs)
        pulse_us: u16,
        /// True for the first card dealt during calibration
        calibration: bool,
    },
    /// Cards still owed to a player after a deal
    Remaining {
        /// 1-based player number
        number: u8,
        /// Cards left
        left: u8,
    },
}

impl<'a> Record<'a> {
    /// Parse a single line (with or without its line terminator)
    pub fn parse(line: &'a str) -> Result<Self, RecordError> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            return Err(RecordError::Empty);
        }
        if line == CSV_HEADER {
            return Ok(Record::Header);
        }

        let mut fields = line.splitn(3, ',');
        let raw = fields.next().ok_or(RecordError::MissingField)?;
        let filtered = fields.next().ok_or(RecordError::MissingField)?;
        let event = fields.next().ok_or(RecordError::MissingField)?;

        match (raw.is_empty(), filtered.is_empty(), event.is_empty()) {
            (false, false, true) => Ok(Record::Sample {
                raw_cm: parse_number(raw)?,
                filtered_cm: parse_number(filtered)?,
            }),
            (true, true, false) => parse_event(event),
            _ => Err(RecordError::MissingField),
        }
    }

    /// Encode into a terminated line ready for the UART
    pub fn to_line(&self) -> Result<String<MAX_LINE_LEN>, RecordError> {
        let mut line = String::new();
        write!(line, "{}{}", self, LINE_END).map_err(|_| RecordError::LineTooLong)?;
        Ok(line)
    }

    /// Returns true if this record carries an event column
    pub fn is_event(&self) -> bool {
        !matches!(self, Record::Header | Record::Sample { .. })
    }
}

impl fmt::Display for Record<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Record::Header => f.write_str(CSV_HEADER),
            Record::Sample {
                raw_cm,
                filtered_cm,
            } => write!(f, "{},{},", raw_cm, filtered_cm),
            Record::Phase(tag) => write!(f, ",,HSM={}", tag.as_str()),
            Record::Game(name) => write!(f, ",,GAME={}", name),
            Record::Ready => f.write_str(",,READY"),
            Record::Player { number, pulse_us } => write!(f, ",,PLAYER{}={}", number, pulse_us),
            Record::DealPulse {
                pulse_us,
                calibration: true,
            } => write!(f, ",,CAL_DEAL_PULSE={}", pulse_us),
            Record::DealPulse {
                pulse_us,
                calibration: false,
            } => write!(f, ",,DEAL_PULSE={}", pulse_us),
            Record::Remaining { number, left } => write!(f, ",,P{}_LEFT={}", number, left),
        }
    }
}

fn parse_number<T: core::str::FromStr>(text: &str) -> Result<T, RecordError> {
    text.parse().map_err(|_| RecordError::InvalidNumber)
}

fn parse_event(text: &str) -> Result<Record<'_>, RecordError> {
    if text == "READY" {
        return Ok(Record::Ready);
    }

    let (key, value) = text.split_once('=').ok_or(RecordError::UnknownEvent)?;
    match key {
        "HSM" => PhaseTag::from_tag(value)
            .map(Record::Phase)
            .ok_or(RecordError::UnknownEvent),
        "GAME" if !value.is_empty() => Ok(Record::Game(value)),
        "CAL_DEAL_PULSE" => Ok(Record::DealPulse {
            pulse_us: parse_number(value)?,
            calibration: true,
        }),
        "DEAL_PULSE" => Ok(Record::DealPulse {
            pulse_us: parse_number(value)?,
            calibration: false,
        }),
        _ => {
            if let Some(number) = key.strip_prefix("PLAYER") {
                Ok(Record::Player {
                    number: parse_number(number)?,
                    pulse_us: parse_number(value)?,
                })
            } else if let Some(number) = key
                .strip_prefix('P')
                .and_then(|rest| rest.strip_suffix("_LEFT"))
            {
                Ok(Record::Remaining {
                    number: parse_number(number)?,
                    left: parse_number(value)?,
                })
            } else {
                Err(RecordError::UnknownEvent)
            }
        }
    }
}
