//! # Structured Logging
//!
//! tracing-subscriber setup shared by the CLI and tests: text output for
//! development, JSON lines in production.

use crate::config::{AppConfig, Environment};
use std::io;
use tracing_subscriber::{fmt::Layer, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "warn")
    pub level: String,
    /// Enable JSON structured logging (vs plain text)
    pub json_format: bool,
    /// Include file and line number information
    pub include_location: bool,
    /// Environment filter (supports complex filters like "inkpost_db=debug,sqlx=warn")
    pub env_filter: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            include_location: false,
            env_filter: None,
        }
    }
}

impl LoggingConfig {
    /// Create production logging configuration
    pub fn production(level: &str) -> Self {
        Self {
            level: level.to_string(),
            json_format: true,
            include_location: false,
            env_filter: Some(format!("{},sqlx=warn", level)),
        }
    }

    /// Create development logging configuration
    pub fn development(level: &str) -> Self {
        Self {
            level: level.to_string(),
            json_format: false,
            include_location: true,
            env_filter: Some(format!("{},sqlx=info", level)),
        }
    }

    /// Create test logging configuration (minimal output)
    pub fn test() -> Self {
        Self {
            level: "error".to_string(),
            json_format: false,
            include_location: false,
            env_filter: Some("error".to_string()),
        }
    }

    /// Pick the configuration matching the application's environment
    pub fn for_app(config: &AppConfig) -> Self {
        match config.environment {
            Environment::Production => Self::production(&config.log_level),
            Environment::Development => Self::development(&config.log_level),
            Environment::Testing => Self::test(),
        }
    }
}

/// Install the global subscriber.
///
/// Returns `Ok(false)` without touching anything when a subscriber is already
/// installed, so calling it again from a second entry point is harmless.
pub fn init_logging(config: LoggingConfig) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
    if tracing::dispatcher::has_been_set() {
        return Ok(false);
    }

    let env_filter = config.env_filter.as_deref().unwrap_or(&config.level);
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(env_filter))?;

    if config.json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                Layer::new()
                    .with_writer(io::stderr)
                    .with_file(config.include_location)
                    .with_line_number(config.include_location)
                    .json(),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                Layer::new()
                    .with_writer(io::stderr)
                    .with_file(config.include_location)
                    .with_line_number(config.include_location),
            )
            .try_init()?;
    }

    tracing::debug!(
        target: "inkpost::logging",
        "Structured logging initialized (level: {}, format: {})",
        config.level,
        if config.json_format { "JSON" } else { "text" }
    );

    Ok(true)
}
