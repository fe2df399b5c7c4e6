//! # inkpost-db
//!
//! Database connection and schema migration engine for the inkpost blog
//! service. Backends are selected at runtime from the connection URL
//! (PostgreSQL, MySQL or SQLite).

pub mod database;
pub mod error;
pub mod migrations;

pub use database::{Database, DatabaseBackendType};
pub use error::{ConnectivityError, MigrationError, MigrationResult, RegistrationError};
pub use migrations::{
    Migration, MigrationDirection, MigrationId, MigrationRegistry, MigrationReport, MigrationRunner,
    MigrationTarget, RunnerOptions, SchemaInit, SqlMigration, StatusReport, VersionResolver,
};

// Re-exported so migration units need no direct sqlx dependency
pub use async_trait::async_trait;
pub use sqlx::AnyConnection;
