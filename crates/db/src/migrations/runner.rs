//! Migration Runner - Executes migrations against the database
//!
//! Each step runs in its own transaction together with its ledger update, so
//! the ledger always reflects exactly the steps that committed. A failing step
//! aborts the run; re-running resumes from whatever version was reached.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use inkpost_core::config::{DatabaseConfig, DEFAULT_MIGRATIONS_TABLE};
use sqlx::AnyConnection;

use super::definitions::{
    MigrationDirection, MigrationReport, MigrationStatus, MigrationTarget, SchemaInit, StatusReport,
    SCHEMA_INIT_ID,
};
use super::id::MigrationId;
use super::ledger::{Ledger, VersionResolver};
use super::plan::MigrationPlan;
use super::registry::{MigrationRegistry, RegisteredMigration, RegistryBuilder};
use crate::database::Database;
use crate::error::{MigrationError, MigrationResult};

/// Runner behaviour switches
#[derive(Debug, Clone)]
pub struct RunnerOptions {
    /// Ledger table name
    pub table: String,
    /// Refuse to run when the ledger holds IDs this build does not register
    pub validate_unknown_migrations: bool,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            table: DEFAULT_MIGRATIONS_TABLE.to_string(),
            validate_unknown_migrations: false,
        }
    }
}

impl RunnerOptions {
    /// Options taken from the database configuration
    pub fn from_config(config: &DatabaseConfig) -> Self {
        Self {
            table: config.migrations_table.clone(),
            validate_unknown_migrations: config.strict_migrations,
        }
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub fn with_unknown_migration_validation(mut self, enabled: bool) -> Self {
        self.validate_unknown_migrations = enabled;
        self
    }
}

/// Migration runner that moves the database to a target version
pub struct MigrationRunner {
    database: Database,
    registry: MigrationRegistry,
    resolver: VersionResolver,
    options: RunnerOptions,
    schema_init: Option<Arc<dyn SchemaInit>>,
}

impl MigrationRunner {
    /// Create a new migration runner
    pub fn new(database: Database, registry: MigrationRegistry, options: RunnerOptions) -> Self {
        let resolver = VersionResolver::new(&database, options.table.clone());
        Self {
            database,
            registry,
            resolver,
            options,
            schema_init: None,
        }
    }

    /// Register `units`, then connect to the configured database.
    ///
    /// An invalid migration set fails before the database is contacted.
    pub async fn connect(config: &DatabaseConfig, units: RegistryBuilder) -> MigrationResult<Self> {
        let registry = units.build()?;
        let database = Database::connect(config).await?;
        Ok(Self::new(database, registry, RunnerOptions::from_config(config)))
    }

    /// Create the full schema in one step when migrating a fresh database to latest
    pub fn with_schema_init<S: SchemaInit + 'static>(mut self, init: S) -> Self {
        self.schema_init = Some(Arc::new(init));
        self
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn registry(&self) -> &MigrationRegistry {
        &self.registry
    }

    pub fn options(&self) -> &RunnerOptions {
        &self.options
    }

    fn ledger(&self) -> &Ledger {
        self.resolver.ledger()
    }

    /// Current schema version according to the ledger
    pub async fn current_version(&self) -> MigrationResult<Option<MigrationId>> {
        self.resolver.current_version().await
    }

    /// Move the database to `target`
    pub async fn run(&self, target: &MigrationTarget) -> MigrationResult<MigrationReport> {
        let start_time = Instant::now();

        let current = self.resolver.current_version().await?;
        self.check_unknown_migrations().await?;
        self.ensure_ledger_table().await?;

        if self.should_init_schema(current.as_ref(), target).await? {
            self.init_schema().await?;
            let to_version = self.resolver.current_version().await?;
            return Ok(MigrationReport {
                direction: MigrationDirection::Up,
                from_version: None,
                to_version,
                applied: Vec::new(),
                rolled_back: Vec::new(),
                schema_initialized: true,
                execution_time_ms: start_time.elapsed().as_millis(),
            });
        }

        let universe = self.registry.ordered_units();
        let plan = MigrationPlan::compute(current.as_ref(), target, &universe);

        if plan.is_empty() {
            tracing::info!(
                "database already at {}, nothing to migrate",
                current.as_ref().map_or("none", |id| id.as_str())
            );
        } else if plan.direction == MigrationDirection::Down {
            tracing::warn!(
                "rolling back {} migration(s) from {} to {}",
                plan.steps.len(),
                current.as_ref().map_or("none", |id| id.as_str()),
                plan.to.as_ref().map_or("none", |id| id.as_str())
            );
        } else {
            tracing::info!(
                "applying {} migration(s) from {} to {}",
                plan.steps.len(),
                current.as_ref().map_or("none", |id| id.as_str()),
                plan.to.as_ref().map_or("none", |id| id.as_str())
            );
        }

        let mut completed = Vec::with_capacity(plan.steps.len());
        for migration in &plan.steps {
            if let Err(source) = self.execute_step(migration, plan.direction).await {
                tracing::error!(
                    "migration {} failed while {}: {:#}",
                    migration.id(),
                    plan.direction,
                    source
                );
                return Err(MigrationError::StepExecution {
                    id: migration.id().clone(),
                    direction: plan.direction,
                    completed,
                    source,
                });
            }
            completed.push(migration.id().clone());
        }

        let to_version = self.resolver.current_version().await?;
        let (applied, rolled_back) = match plan.direction {
            MigrationDirection::Up => (completed, Vec::new()),
            MigrationDirection::Down => (Vec::new(), completed),
        };

        Ok(MigrationReport {
            direction: plan.direction,
            from_version: current,
            to_version,
            applied,
            rolled_back,
            schema_initialized: false,
            execution_time_ms: start_time.elapsed().as_millis(),
        })
    }

    /// Applied and pending state of every registered migration
    pub async fn status(&self) -> MigrationResult<StatusReport> {
        let current_version = self.resolver.current_version().await?;
        let applied = self.resolver.applied().await?;

        let mut migrations = Vec::with_capacity(self.registry.len());
        for migration in self.registry.ordered_units() {
            let applied_at = applied
                .iter()
                .find(|entry| migration.id() == entry.id.as_str())
                .map(|entry| entry.applied_at.clone());

            if applied_at.is_none() && current_version.as_ref().map_or(false, |current| migration.id() < current) {
                tracing::warn!(
                    "migration {} is pending but older than the current version; it will never run",
                    migration.id()
                );
            }

            migrations.push(MigrationStatus {
                id: migration.id().clone(),
                description: migration.unit().description().to_string(),
                applied_at,
            });
        }

        let unknown = applied
            .into_iter()
            .map(|entry| entry.id)
            .filter(|id| !self.registry.contains(id))
            .collect();

        Ok(StatusReport {
            current_version,
            migrations,
            unknown,
        })
    }

    async fn check_unknown_migrations(&self) -> MigrationResult<()> {
        let unknown: Vec<String> = self
            .resolver
            .applied()
            .await?
            .into_iter()
            .map(|entry| entry.id)
            .filter(|id| !self.registry.contains(id))
            .collect();

        if unknown.is_empty() {
            return Ok(());
        }

        if self.options.validate_unknown_migrations {
            return Err(MigrationError::UnknownMigrations { ids: unknown });
        }

        tracing::warn!(
            "ledger holds migrations unknown to this build: {}",
            unknown.join(", ")
        );
        Ok(())
    }

    async fn ensure_ledger_table(&self) -> MigrationResult<()> {
        let mut conn = self
            .database
            .pool()
            .acquire()
            .await
            .map_err(|source| MigrationError::Ledger {
                table: self.options.table.clone(),
                source,
            })?;
        self.ledger().ensure_table(&mut conn).await
    }

    async fn should_init_schema(
        &self,
        current: Option<&MigrationId>,
        target: &MigrationTarget,
    ) -> MigrationResult<bool> {
        if self.schema_init.is_none() || current.is_some() || *target != MigrationTarget::Latest {
            return Ok(false);
        }
        Ok(!self.resolver.has_schema_init().await?)
    }

    /// Run the `SchemaInit` and mark every registered migration applied, atomically
    async fn init_schema(&self) -> MigrationResult<()> {
        let Some(init) = self.schema_init.as_ref() else {
            return Ok(());
        };

        tracing::info!("initializing schema on a fresh database");
        let ids: BTreeSet<String> = self
            .registry
            .ordered_units()
            .iter()
            .map(|m| m.id().to_string())
            .collect();

        let result = async {
            let mut tx = self.database.pool().begin().await.context("failed to begin transaction")?;
            let outcome = async {
                init.init(&mut *tx).await?;
                self.ledger()
                    .record(&mut *tx, SCHEMA_INIT_ID)
                    .await
                    .context("failed to record schema initialization")?;
                for id in &ids {
                    self.ledger()
                        .record(&mut *tx, id)
                        .await
                        .with_context(|| format!("failed to record migration {}", id))?;
                }
                anyhow::Ok(())
            }
            .await;
            finish_transaction(tx, outcome).await
        }
        .await;

        result.map_err(|source| MigrationError::SchemaInit { source })
    }

    async fn execute_step(&self, migration: &RegisteredMigration, direction: MigrationDirection) -> anyhow::Result<()> {
        tracing::info!("{} migration {}", direction, migration.id());

        let mut tx = self.database.pool().begin().await.context("failed to begin transaction")?;
        let outcome = self.step_body(&mut *tx, migration, direction).await;
        finish_transaction(tx, outcome).await
    }

    async fn step_body(
        &self,
        conn: &mut AnyConnection,
        migration: &RegisteredMigration,
        direction: MigrationDirection,
    ) -> anyhow::Result<()> {
        let id = migration.id().as_str();
        match direction {
            MigrationDirection::Up => {
                migration.unit().up(conn).await?;
                self.ledger()
                    .record(conn, id)
                    .await
                    .with_context(|| format!("failed to record migration {}", id))?;
            }
            MigrationDirection::Down => {
                migration.unit().down(conn).await?;
                self.ledger()
                    .remove(conn, id)
                    .await
                    .with_context(|| format!("failed to remove migration {} from ledger", id))?;
            }
        }
        Ok(())
    }
}

/// Commit on success, roll back on failure
async fn finish_transaction(
    tx: sqlx::Transaction<'_, sqlx::Any>,
    outcome: anyhow::Result<()>,
) -> anyhow::Result<()> {
    match outcome {
        Ok(()) => tx.commit().await.context("failed to commit transaction"),
        Err(e) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::error!("rollback failed: {}", rollback_err);
            }
            Err(e)
        }
    }
}
