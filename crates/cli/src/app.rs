//! Composition root: configuration, logging, registry and database, wired once per process.

use anyhow::Context;
use inkpost_core::{init_logging, AppConfig, AppConfigTrait, LoggingConfig};
use inkpost_db::{MigrationRegistry, MigrationRunner};

use crate::migrations;

pub struct App {
    pub config: AppConfig,
}

impl App {
    /// Load configuration from the environment and install the log subscriber
    pub fn bootstrap() -> anyhow::Result<Self> {
        let config = AppConfig::from_env().context("invalid configuration")?;

        let installed = init_logging(LoggingConfig::for_app(&config))
            .map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))?;
        if !installed {
            tracing::debug!("log subscriber already installed");
        }

        Ok(Self { config })
    }

    /// Register the compiled-in migrations and connect to the database
    pub async fn runner(&self) -> anyhow::Result<MigrationRunner> {
        let units = MigrationRegistry::builder().extend(migrations::all());
        let runner = MigrationRunner::connect(&self.config.database, units)
            .await
            .context("failed to prepare migrations")?;

        if runner.options().validate_unknown_migrations {
            tracing::debug!("strict ledger validation enabled");
        }
        Ok(runner)
    }
}
