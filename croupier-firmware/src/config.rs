//! Dealer configuration
//!
//! The dealer's tunables live in `dealer.toml`, which is checked by the
//! build script and compiled into the firmware. At boot it is parsed and
//! validated again; any problem falls back to the built-in defaults so a
//! bad edit can never leave the dealer unable to start.

use defmt::*;

use croupier_core::config::{parse_config, DealerConfig};

/// Embedded configuration (compiled into firmware)
/// Edit dealer.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../dealer.toml");

/// Load the embedded configuration, or defaults if it is unusable
pub fn load_config() -> DealerConfig {
    let config = match parse_config(EMBEDDED_CONFIG) {
        Ok(config) => config,
        Err(e) => {
            warn!(
                "dealer.toml line {}: {:?}, using defaults",
                e.line, e.kind
            );
            return DealerConfig::default();
        }
    };

    if let Err(e) = config.validate() {
        warn!("dealer.toml rejected: {:?}, using defaults", e);
        return DealerConfig::default();
    }

    info!(
        "Sweep {}-{} us in {} steps of {} ms, watchdog {} ms",
        config.sweep.min_pulse_us,
        config.sweep.max_pulse_us,
        config.steps_per_sweep(),
        config.sweep.step_ms,
        config.watchdog_ms
    );
    config
}
