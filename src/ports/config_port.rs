//! Configuration access port trait.
//!
//! Strategy parameters live in one section per strategy id, e.g. `[macd]`.
//! The `get_*` reads fall back to the default on anything they cannot parse;
//! the `try_*` reads and `get_count` only fall back when the key is absent.

use std::str::FromStr;

use crate::domain::error::SimulatorError;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;
    fn get_double(&self, section: &str, key: &str, default: f64) -> f64;
    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool;

    /// A number; unparseable text is a configuration error.
    fn try_double(&self, section: &str, key: &str, default: f64) -> Result<f64, SimulatorError> {
        parse_value(self.get_string(section, key), section, key, default, "a number")
    }

    /// A boolean; unrecognised spellings are a configuration error.
    fn try_bool(&self, section: &str, key: &str, default: bool) -> Result<bool, SimulatorError> {
        match self.get_string(section, key) {
            None => Ok(default),
            Some(raw) => parse_bool(&raw).ok_or_else(|| invalid(section, key, &raw, "true or false")),
        }
    }

    /// A non-negative integer such as a period or window length.
    fn get_count(&self, section: &str, key: &str, default: usize) -> Result<usize, SimulatorError> {
        parse_value(
            self.get_string(section, key),
            section,
            key,
            default,
            "a non-negative integer",
        )
    }
}

/// `true/yes/on/1` and `false/no/off/0`, case-insensitive.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

fn parse_value<T: FromStr>(
    raw: Option<String>,
    section: &str,
    key: &str,
    default: T,
    expected: &str,
) -> Result<T, SimulatorError> {
    match raw {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| invalid(section, key, &raw, expected)),
    }
}

fn invalid(section: &str, key: &str, raw: &str, expected: &str) -> SimulatorError {
    SimulatorError::configuration(
        &format!("[{section}] {key}"),
        format!("must be {expected}, got '{}'", raw.trim()),
    )
}
