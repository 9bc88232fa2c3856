//! Environment configuration helpers

use std::env;
use std::str::FromStr;

use thiserror::Error;

use crate::crypto::{from_base64, random_secret};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(String),

    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: String, reason: String },
}

/// Read a required variable
pub fn env_required(name: &str) -> Result<String, ConfigError> {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::Missing(name.to_string()))
}

/// Read a variable or fall back to `default`
pub fn env_or(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Parse a variable, `default` when unset
pub fn env_parse<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => {
            raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
                name: name.to_string(),
                reason: e.to_string(),
            })
        }
        _ => Ok(default),
    }
}

/// Boolean flag: `true`/`1`/`yes`/`on` (case-insensitive)
pub fn env_bool(name: &str, default: bool) -> Result<bool, ConfigError> {
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => parse_bool(name, &raw),
        _ => Ok(default),
    }
}

fn parse_bool(name: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(ConfigError::Invalid {
            name: name.to_string(),
            reason: format!("expected a boolean, got '{other}'"),
        }),
    }
}

/// Comma separated list, empty entries dropped
pub fn env_list(name: &str, default: &str) -> Vec<String> {
    env_or(name, default)
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// 32-byte secret encoded as standard base64
///
/// Debug builds fall back to a random per-process secret when unset;
/// release builds require it.
pub fn env_secret_32(name: &str) -> Result<[u8; 32], ConfigError> {
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => decode_secret_32(name, raw.trim()),
        _ if cfg!(debug_assertions) => {
            tracing::warn!(variable = name, "Secret not set, using a random development value");
            Ok(random_secret())
        }
        _ => Err(ConfigError::Missing(name.to_string())),
    }
}

fn decode_secret_32(name: &str, encoded: &str) -> Result<[u8; 32], ConfigError> {
    let bytes = from_base64(encoded).map_err(|e| ConfigError::Invalid {
        name: name.to_string(),
        reason: e.to_string(),
    })?;

    bytes.try_into().map_err(|b: Vec<u8>| ConfigError::Invalid {
        name: name.to_string(),
        reason: format!("expected 32 bytes, got {}", b.len()),
    })
}
