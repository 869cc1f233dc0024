//! Environment variable parsing utilities
//!
//! A variable that is present but fails to parse is an error, never a silent
//! fallback to the default.

use std::str::FromStr;

/// Parse an environment variable, falling back to `default` when it is unset.
///
/// # Example
/// ```ignore
/// let port: u16 = parse_env_or("PORT", 8080)?;
/// ```
pub fn parse_env_or<T: FromStr>(key: &str, default: T) -> Result<T, String> {
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| format!("Failed to parse {}='{}'", key, raw)),
        _ => Ok(default),
    }
}

/// Read a string environment variable, falling back to `default` when unset or empty.
pub fn env_or(key: &str, default: &str) -> String {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => value,
        _ => default.to_string(),
    }
}

/// Read an optional string environment variable (empty counts as unset).
pub fn env_optional(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
