//! Croupier Telemetry Protocol
//!
//! This crate defines the line-oriented telemetry stream the dealer writes to
//! its console UART. The stream is CSV so it can be fed straight into a
//! plotting tool while the dealer runs.
//!
//! # Protocol Overview
//!
//! Every line has three columns:
//! ```text
//! raw_cm,filt_cm,event
//! 142,142,
//! ,,PLAYER1=1380
//! ,,HSM=FDEAL
//! ```
//!
//! Distance samples fill the first two columns and leave `event` empty.
//! Event lines leave the distance columns empty. Lines end with `\r\n`.

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(unsafe_code)]

pub mod phase;
pub mod record;

pub use phase::PhaseTag;
pub use record::{Record, RecordError, CSV_HEADER, MAX_LINE_LEN};
