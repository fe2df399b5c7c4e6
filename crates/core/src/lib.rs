pub mod config;
pub mod logging;

pub use config::validation::ConfigError;
pub use config::{AppConfig, AppConfigTrait, DatabaseConfig, Environment};
pub use logging::{init_logging, LoggingConfig};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Service name used in logs and CLI output
pub const SERVICE_NAME: &str = "inkpost";

/// Get service version
pub fn version() -> &'static str {
    VERSION
}
