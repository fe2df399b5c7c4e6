pub mod app_config;
pub mod database;
pub mod sources;
pub mod validation;

pub use app_config::*;
pub use database::*;
pub use sources::*;
pub use validation::*;

use std::env;

/// Read an environment variable, treating empty values as unset
pub(crate) fn env_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Read an environment variable or fall back to `default`
pub(crate) fn env_or(key: &str, default: &str) -> String {
    env_var(key).unwrap_or_else(|| default.to_string())
}

/// Parse an environment variable, reporting the field name on failure
pub(crate) fn env_parse<T: std::str::FromStr>(
    key: &str,
    field: &str,
    default: T,
    expected: &str,
) -> Result<T, ConfigError> {
    match env_var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::invalid_value(field, raw, expected)),
        None => Ok(default),
    }
}
