//! Error types for the database layer
//!
//! `RegistrationError` and `ConnectivityError` are startup failures;
//! `MigrationRunner::connect` wraps them into `MigrationError`, which is what
//! every runner operation hands back to its caller.

use crate::migrations::{MigrationDirection, MigrationId};
use std::time::Duration;
use thiserror::Error;

/// Result type alias for migration operations
pub type MigrationResult<T> = Result<T, MigrationError>;

/// Rejected registration of a migration unit.
///
/// Indicates a defect in the migration source set, never a transient condition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("Invalid migration ID '{id}': expected YYYYMMDD_HHMMSS. Do not modify IDs generated by make-migration")]
    InvalidId { id: String },

    #[error("Migration {id} is already registered. Does another migration share the same ID?")]
    DuplicateId { id: String },
}

/// The database could not be reached at startup
#[derive(Debug, Error)]
pub enum ConnectivityError {
    #[error("Unsupported database URL scheme '{scheme}' (expected postgres, mysql or sqlite)")]
    UnsupportedBackend { scheme: String },

    #[error("Database {endpoint} did not respond within {}s", .timeout.as_secs())]
    Timeout { endpoint: String, timeout: Duration },

    #[error("Failed to connect database {endpoint}: {source}")]
    Unreachable {
        endpoint: String,
        #[source]
        source: sqlx::Error,
    },
}

/// Failure of a migration run
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    #[error(transparent)]
    Connectivity(#[from] ConnectivityError),

    #[error("Failed to query current database version: {source}")]
    VersionQuery {
        #[source]
        source: sqlx::Error,
    },

    #[error("Migration ledger contains malformed ID '{id}'")]
    CorruptLedger { id: String },

    #[error("Failed to prepare migration ledger '{table}': {source}")]
    Ledger {
        table: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Migration {id} failed while {direction}: {source}")]
    StepExecution {
        id: MigrationId,
        direction: MigrationDirection,
        /// Steps committed by this run before the failing one
        completed: Vec<MigrationId>,
        #[source]
        source: anyhow::Error,
    },

    #[error("Schema initialization failed: {source}")]
    SchemaInit {
        #[source]
        source: anyhow::Error,
    },

    #[error("Database contains applied migrations unknown to this build: {}", join_ids(.ids))]
    UnknownMigrations { ids: Vec<String> },

    #[error("Invalid migration target '{value}': {reason}")]
    InvalidTarget { value: String, reason: String },
}

impl MigrationError {
    /// ID of the unit whose step failed, if this is a step failure
    pub fn failed_migration(&self) -> Option<&MigrationId> {
        match self {
            MigrationError::StepExecution { id, .. } => Some(id),
            _ => None,
        }
    }

    /// Whether re-invoking the run can make progress without code changes
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            MigrationError::StepExecution { .. }
                | MigrationError::SchemaInit { .. }
                | MigrationError::VersionQuery { .. }
                | MigrationError::Connectivity(ConnectivityError::Timeout { .. })
                | MigrationError::Connectivity(ConnectivityError::Unreachable { .. })
        )
    }
}

fn join_ids(ids: &[String]) -> String {
    ids.join(", ")
}
