//! Schema migrations
//!
//! Units are registered explicitly into a [`MigrationRegistry`], the
//! [`VersionResolver`] reads the ledger, and the [`MigrationRunner`] walks the
//! database forward or backward one transaction per step.

pub mod definitions;
pub mod id;
pub mod ledger;
pub mod plan;
pub mod registry;
pub mod runner;
pub mod sql;

pub use definitions::{
    LedgerEntry, Migration, MigrationDirection, MigrationReport, MigrationStatus, MigrationTarget,
    SchemaInit, StatusReport, SCHEMA_INIT_ID,
};
pub use id::{MigrationId, MIGRATION_ID_FORMAT, MIGRATION_ID_LEN};
pub use ledger::{Ledger, VersionResolver};
pub use plan::MigrationPlan;
pub use registry::{MigrationRegistry, RegisteredMigration, RegistryBuilder};
pub use runner::{MigrationRunner, RunnerOptions};
pub use sql::{execute_script, split_sql_statements, SqlMigration};
