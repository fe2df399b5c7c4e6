use crate::config::{
    env_or, env_var, ConfigError, ConfigSource, ConfigValidator, DatabaseConfig, LogLevelValidator,
};
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Default location of migration units, relative to the base directory
pub const DEFAULT_MIGRATIONS_DIR: &str = "crates/cli/src/migrations";

/// Configuration trait for application configuration
pub trait AppConfigTrait: Sized {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self, ConfigError>;

    /// Validate the configuration
    fn validate(&self) -> Result<(), ConfigError>;

    /// Get configuration source information for debugging
    fn config_sources(&self) -> HashMap<String, ConfigSource>;
}

/// Environment enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Testing,
    Production,
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "testing" | "test" => Ok(Environment::Testing),
            "production" | "prod" | "release" => Ok(Environment::Production),
            _ => Err(ConfigError::InvalidValue {
                field: "environment".to_string(),
                value: s.to_string(),
                expected: "development, testing, or production".to_string(),
            }),
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let env_str = match self {
            Environment::Development => "development",
            Environment::Testing => "testing",
            Environment::Production => "production",
        };
        write!(f, "{}", env_str)
    }
}

/// Process-wide configuration, assembled once by the composition root
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub log_level: String,
    /// Project root; scaffolded files are written relative to it
    pub base_dir: PathBuf,
    /// Directory holding migration unit sources, relative to `base_dir` unless absolute
    pub migrations_dir: PathBuf,
    pub database: DatabaseConfig,
}

impl AppConfig {
    /// Resolved directory for new migration units
    pub fn migrations_path(&self) -> PathBuf {
        if self.migrations_dir.is_absolute() {
            self.migrations_dir.clone()
        } else {
            self.base_dir.join(&self.migrations_dir)
        }
    }
}

impl AppConfigTrait for AppConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let environment = match env_var("ENVIRONMENT") {
            Some(raw) => raw.parse()?,
            None => Environment::Production,
        };

        let base_dir = match env_var("BASE_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => env::current_dir()?,
        };

        let config = Self {
            environment,
            log_level: env_or("LOG_LEVEL", "info").to_lowercase(),
            base_dir,
            migrations_dir: PathBuf::from(env_or("MIGRATIONS_DIR", DEFAULT_MIGRATIONS_DIR)),
            database: DatabaseConfig::from_env()?,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        LogLevelValidator.validate(self.log_level.as_str())?;
        self.database.validate()
    }

    fn config_sources(&self) -> HashMap<String, ConfigSource> {
        let mut sources = HashMap::new();

        sources.insert(
            "environment".to_string(),
            ConfigSource::of_env("ENVIRONMENT", "production"),
        );
        sources.insert("log_level".to_string(), ConfigSource::of_env("LOG_LEVEL", "info"));
        sources.insert(
            "base_dir".to_string(),
            ConfigSource::of_env("BASE_DIR", "current directory"),
        );
        sources.insert(
            "migrations_dir".to_string(),
            ConfigSource::of_env("MIGRATIONS_DIR", DEFAULT_MIGRATIONS_DIR),
        );
        sources.insert("database_url".to_string(), self.database.url_source());
        sources.insert(
            "migrations_table".to_string(),
            ConfigSource::of_env("MIGRATIONS_TABLE", crate::config::DEFAULT_MIGRATIONS_TABLE),
        );
        sources.insert(
            "strict_migrations".to_string(),
            ConfigSource::of_env("MIGRATIONS_STRICT", "false"),
        );

        sources
    }
}
