//! Configuration types
//!
//! Board-agnostic dealer configuration, loaded from a small TOML file.

pub mod parse;
pub mod types;

pub use parse::{parse_config, ParseError, ParseErrorKind};
pub use types::*;
