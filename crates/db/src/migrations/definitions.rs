//! Migration Definitions - Core types and structures for migrations
//!
//! Defines the unit of schema change (`Migration`), the ledger record, run
//! targets and the reports handed back to callers.

use async_trait::async_trait;
use serde::Serialize;
use sqlx::AnyConnection;
use std::fmt;
use std::str::FromStr;

use super::id::MigrationId;
use crate::error::MigrationError;

/// Reserved ledger row written when the schema was created by a `SchemaInit`
pub const SCHEMA_INIT_ID: &str = "SCHEMA_INIT";

/// One reversible schema change.
///
/// `up` and `down` run inside the step's transaction; the ledger row is
/// written on the same connection right after, so returning an error discards
/// both (on backends with transactional DDL).
#[async_trait]
pub trait Migration: Send + Sync {
    /// Timestamp ID (`YYYYMMDD_HHMMSS`) generated by `make-migration`; never hand-edit it
    fn id(&self) -> &str;

    /// Human-readable summary shown by `status`
    fn description(&self) -> &str {
        ""
    }

    /// Apply the schema change
    async fn up(&self, conn: &mut AnyConnection) -> anyhow::Result<()>;

    /// Revert exactly what `up` did
    async fn down(&self, conn: &mut AnyConnection) -> anyhow::Result<()>;
}

/// Creates the complete current schema on a fresh database in one go.
///
/// When attached to the runner it replaces replaying every migration from the
/// beginning of time; all registered IDs are then recorded as applied.
#[async_trait]
pub trait SchemaInit: Send + Sync {
    async fn init(&self, conn: &mut AnyConnection) -> anyhow::Result<()>;
}

/// Migration direction for execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MigrationDirection {
    /// Apply migrations (run `up`)
    Up,
    /// Roll migrations back (run `down`)
    Down,
}

impl fmt::Display for MigrationDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationDirection::Up => write!(f, "applying"),
            MigrationDirection::Down => write!(f, "rolling back"),
        }
    }
}

/// Version a run should end at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationTarget {
    /// The greatest registered ID
    Latest,
    /// A specific point in time; need not be a registered ID
    Version(MigrationId),
}

impl MigrationTarget {
    /// Parse a CLI argument; absent, empty and `latest` all mean `Latest`
    pub fn from_arg(raw: Option<&str>) -> Result<Self, MigrationError> {
        match raw.map(str::trim) {
            None | Some("") => Ok(MigrationTarget::Latest),
            Some(value) => value.parse(),
        }
    }
}

impl FromStr for MigrationTarget {
    type Err = MigrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || s.eq_ignore_ascii_case("latest") {
            return Ok(MigrationTarget::Latest);
        }
        MigrationId::parse(s)
            .map(MigrationTarget::Version)
            .map_err(|e| MigrationError::InvalidTarget {
                value: s.to_string(),
                reason: e.to_string(),
            })
    }
}

impl fmt::Display for MigrationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationTarget::Latest => write!(f, "latest"),
            MigrationTarget::Version(id) => write!(f, "{}", id),
        }
    }
}

/// Applied migration as recorded in the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerEntry {
    /// Migration ID
    pub id: String,
    /// When the migration was applied (RFC 3339)
    pub applied_at: String,
}

/// Result of a migration run
#[derive(Debug, Clone, Serialize)]
pub struct MigrationReport {
    /// Direction chosen for this run
    pub direction: MigrationDirection,
    /// Version before the run (`None` for a fresh database)
    pub from_version: Option<MigrationId>,
    /// Version after the run
    pub to_version: Option<MigrationId>,
    /// IDs applied, in execution order
    pub applied: Vec<MigrationId>,
    /// IDs rolled back, in execution order
    pub rolled_back: Vec<MigrationId>,
    /// Whether the schema was created through `SchemaInit`
    pub schema_initialized: bool,
    /// Total execution time in milliseconds
    pub execution_time_ms: u128,
}

impl MigrationReport {
    /// Number of steps executed
    pub fn step_count(&self) -> usize {
        self.applied.len() + self.rolled_back.len()
    }

    /// Whether the run changed nothing
    pub fn is_noop(&self) -> bool {
        self.step_count() == 0 && !self.schema_initialized
    }
}

/// Status of one registered migration
#[derive(Debug, Clone, Serialize)]
pub struct MigrationStatus {
    pub id: MigrationId,
    pub description: String,
    /// Set when the ledger has a row for this migration
    pub applied_at: Option<String>,
}

impl MigrationStatus {
    pub fn is_applied(&self) -> bool {
        self.applied_at.is_some()
    }
}

/// Full ledger/registry comparison reported by `status`
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub current_version: Option<MigrationId>,
    pub migrations: Vec<MigrationStatus>,
    /// Ledger IDs with no registered unit
    pub unknown: Vec<String>,
}

impl StatusReport {
    /// Registered migrations not yet applied
    pub fn pending(&self) -> impl Iterator<Item = &MigrationStatus> {
        self.migrations.iter().filter(|m| !m.is_applied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_parsing() {
        assert_eq!(MigrationTarget::from_arg(None).unwrap(), MigrationTarget::Latest);
        assert_eq!(MigrationTarget::from_arg(Some("")).unwrap(), MigrationTarget::Latest);
        assert_eq!(MigrationTarget::from_arg(Some("  ")).unwrap(), MigrationTarget::Latest);
        assert_eq!("LATEST".parse::<MigrationTarget>().unwrap(), MigrationTarget::Latest);

        let target: MigrationTarget = "20250322_123456".parse().unwrap();
        assert_eq!(
            target,
            MigrationTarget::Version(MigrationId::parse("20250322_123456").unwrap())
        );
        assert_eq!(target.to_string(), "20250322_123456");
    }

    #[test]
    fn test_target_rejects_malformed_ids() {
        let err = "2025-03-22".parse::<MigrationTarget>().unwrap_err();
        assert!(matches!(err, MigrationError::InvalidTarget { ref value, .. } if value == "2025-03-22"));
    }

    #[test]
    fn test_report_serializes_ids_as_strings() {
        let id = MigrationId::parse("20250322_123456").unwrap();
        let report = MigrationReport {
            direction: MigrationDirection::Down,
            from_version: Some(id.clone()),
            to_version: None,
            applied: Vec::new(),
            rolled_back: vec![id],
            schema_initialized: false,
            execution_time_ms: 3,
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["direction"], "down");
        assert_eq!(json["from_version"], "20250322_123456");
        assert!(json["to_version"].is_null());
        assert_eq!(json["rolled_back"][0], "20250322_123456");
        assert_eq!(report.step_count(), 1);
        assert!(!report.is_noop());
    }

    #[test]
    fn test_direction_display() {
        assert_eq!(MigrationDirection::Up.to_string(), "applying");
        assert_eq!(MigrationDirection::Down.to_string(), "rolling back");
    }
}
