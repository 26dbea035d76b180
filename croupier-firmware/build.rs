//! Build script for croupier-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates dealer.toml at compile time

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Keys accepted in each table, with their largest allowed value
const ROOT_KEYS: &[(&str, i64)] = &[("watchdog_ms", u32::MAX as i64)];
const SWEEP_KEYS: &[(&str, i64)] = &[
    ("min_pulse_us", u16::MAX as i64),
    ("max_pulse_us", u16::MAX as i64),
    ("step_us", u16::MAX as i64),
    ("step_ms", u32::MAX as i64),
    ("warmup_steps", u8::MAX as i64),
];
const DISPENSE_KEYS: &[(&str, i64)] = &[
    ("settle_ms", u32::MAX as i64),
    ("coast_ms", u32::MAX as i64),
    ("eject_ms", u32::MAX as i64),
    ("lock_ms", u32::MAX as i64),
    ("nudge_ms", u32::MAX as i64),
    ("fast_duty_pct", 100),
];
const DETECTION_KEYS: &[(&str, i64)] = &[("min_separation_us", u16::MAX as i64)];

fn main() {
    setup_linker();
    validate_config();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate dealer.toml at compile time
fn validate_config() {
    println!("cargo:rerun-if-changed=dealer.toml");

    let config_path = Path::new("dealer.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: dealer.toml not found!                                   ║\n\
            ║                                                                  ║\n\
            ║  The firmware embeds a dealer.toml configuration file.           ║\n\
            ║  Please create one in the croupier-firmware directory.           ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read dealer.toml                               ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in dealer.toml                       ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    let mut errors = Vec::new();
    validate_keys(&config, &mut errors);
    if errors.is_empty() {
        validate_values(&config, &mut errors);
    }

    if !errors.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Invalid dealer configuration                             ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            {}\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            errors
                .iter()
                .map(|e| format!("║  • {:<62} ║", e))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }

    println!("cargo:warning=dealer.toml validated successfully");
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Check that every table and key is known and every value is an integer in range
fn validate_keys(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(root) = config.as_table() else {
        errors.push("top level must be a table".to_string());
        return;
    };

    for (name, value) in root {
        let (table, keys) = match (name.as_str(), value) {
            ("sweep", toml::Value::Table(t)) => (t, SWEEP_KEYS),
            ("dispense", toml::Value::Table(t)) => (t, DISPENSE_KEYS),
            ("detection", toml::Value::Table(t)) => (t, DETECTION_KEYS),
            (_, toml::Value::Table(_)) => {
                errors.push(format!("unknown section [{}]", name));
                continue;
            }
            _ => {
                check_key("", name, value, ROOT_KEYS, errors);
                continue;
            }
        };
        for (key, value) in table {
            check_key(name, key, value, keys, errors);
        }
    }
}

fn check_key(
    section: &str,
    key: &str,
    value: &toml::Value,
    keys: &[(&str, i64)],
    errors: &mut Vec<String>,
) {
    let path = if section.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", section, key)
    };

    let Some(&(_, max)) = keys.iter().find(|(k, _)| *k == key) else {
        errors.push(format!("unknown key '{}'", path));
        return;
    };
    match value {
        toml::Value::Integer(n) if *n < 0 || *n > max => {
            errors.push(format!("'{}' must be 0-{}", path, max));
        }
        toml::Value::Integer(_) => {}
        _ => errors.push(format!("'{}' must be an integer", path)),
    }
}

fn get(config: &toml::Value, section: &str, key: &str, default: i64) -> i64 {
    let value = if section.is_empty() {
        config.get(key)
    } else {
        config.get(section).and_then(|t| t.get(key))
    };
    value.and_then(toml::Value::as_integer).unwrap_or(default)
}

/// Cross-field checks, mirroring `DealerConfig::validate`
fn validate_values(config: &toml::Value, errors: &mut Vec<String>) {
    let min_pulse = get(config, "sweep", "min_pulse_us", 1000);
    let max_pulse = get(config, "sweep", "max_pulse_us", 2500);
    let step_us = get(config, "sweep", "step_us", 20);
    let step_ms = get(config, "sweep", "step_ms", 70);

    if min_pulse >= max_pulse {
        errors.push("sweep.min_pulse_us must be below sweep.max_pulse_us".to_string());
    } else if step_us == 0 || step_us > max_pulse - min_pulse {
        errors.push("sweep.step_us must be 1 to the sweep span".to_string());
    }

    let settle = get(config, "dispense", "settle_ms", 800);
    let coast = get(config, "dispense", "coast_ms", 1);
    let eject = get(config, "dispense", "eject_ms", 350);
    let lock = get(config, "dispense", "lock_ms", 175);
    let nudge = get(config, "dispense", "nudge_ms", 100);
    let duty = get(config, "dispense", "fast_duty_pct", 100);

    for (key, value) in [
        ("sweep.step_ms", step_ms),
        ("dispense.settle_ms", settle),
        ("dispense.eject_ms", eject),
        ("dispense.lock_ms", lock),
        ("dispense.nudge_ms", nudge),
    ] {
        if value == 0 {
            errors.push(format!("'{}' must not be zero", key));
        }
    }
    if duty == 0 {
        errors.push("dispense.fast_duty_pct must be 1-100".to_string());
    }

    let sequence = settle + coast + eject + lock;
    let longest_gap = step_ms.max(nudge + sequence);
    let watchdog = get(config, "", "watchdog_ms", 3000);
    if watchdog <= longest_gap {
        errors.push(format!(
            "watchdog_ms must exceed {} (longest gap between kicks)",
            longest_gap
        ));
    }
}
