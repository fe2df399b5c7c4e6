//! Migration ledger - the persisted record of applied migrations
//!
//! One row per applied unit. The greatest ID (ignoring the `SCHEMA_INIT`
//! sentinel) is the database's schema version.

use chrono::Utc;
use sqlx::{AnyConnection, AnyPool, Row};

use super::definitions::{LedgerEntry, SCHEMA_INIT_ID};
use super::id::{MigrationId, MIGRATION_ID_LEN};
use crate::database::{Database, DatabaseBackendType};
use crate::error::{MigrationError, MigrationResult};

/// SQL access to the ledger table
#[derive(Debug, Clone)]
pub struct Ledger {
    table: String,
    backend: DatabaseBackendType,
}

impl Ledger {
    /// `table` must be a plain SQL identifier; configuration validates it
    pub fn new(table: impl Into<String>, backend: DatabaseBackendType) -> Self {
        Self {
            table: table.into(),
            backend,
        }
    }

    fn create_table_sql(&self) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} (id VARCHAR({}) PRIMARY KEY, applied_at VARCHAR(64) NOT NULL)",
            self.table, MIGRATION_ID_LEN
        )
    }

    fn table_exists_sql(&self) -> String {
        let p1 = self.backend.placeholder(1);
        match self.backend {
            DatabaseBackendType::PostgreSQL => format!(
                "SELECT 1 FROM information_schema.tables WHERE table_schema = current_schema() AND table_name = {}",
                p1
            ),
            DatabaseBackendType::MySQL => format!(
                "SELECT 1 FROM information_schema.tables WHERE table_schema = DATABASE() AND table_name = {}",
                p1
            ),
            DatabaseBackendType::SQLite => {
                format!("SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = {}", p1)
            }
        }
    }

    fn current_version_sql(&self) -> String {
        format!(
            "SELECT id FROM {} WHERE id <> {} ORDER BY id DESC LIMIT 1",
            self.table,
            self.backend.placeholder(1)
        )
    }

    fn applied_sql(&self) -> String {
        format!("SELECT id, applied_at FROM {} ORDER BY id ASC", self.table)
    }

    fn record_sql(&self) -> String {
        format!(
            "INSERT INTO {} (id, applied_at) VALUES ({}, {})",
            self.table,
            self.backend.placeholder(1),
            self.backend.placeholder(2)
        )
    }

    fn remove_sql(&self) -> String {
        format!("DELETE FROM {} WHERE id = {}", self.table, self.backend.placeholder(1))
    }

    /// Whether the ledger table exists yet
    pub async fn exists(&self, conn: &mut AnyConnection) -> Result<bool, sqlx::Error> {
        let row = sqlx::query(&self.table_exists_sql())
            .bind(self.table.clone())
            .fetch_optional(&mut *conn)
            .await?;
        Ok(row.is_some())
    }

    /// Create the ledger table if absent
    pub async fn ensure_table(&self, conn: &mut AnyConnection) -> MigrationResult<()> {
        sqlx::query(&self.create_table_sql())
            .execute(&mut *conn)
            .await
            .map_err(|source| MigrationError::Ledger {
                table: self.table.clone(),
                source,
            })?;
        Ok(())
    }

    /// Greatest applied ID, `None` when the table is absent or holds no real entries
    pub async fn current_version(&self, conn: &mut AnyConnection) -> MigrationResult<Option<MigrationId>> {
        let version_query = |source| MigrationError::VersionQuery { source };

        if !self.exists(conn).await.map_err(version_query)? {
            return Ok(None);
        }

        let row = sqlx::query(&self.current_version_sql())
            .bind(SCHEMA_INIT_ID)
            .fetch_optional(&mut *conn)
            .await
            .map_err(version_query)?;

        match row {
            None => Ok(None),
            Some(row) => {
                let id: String = row.try_get("id").map_err(version_query)?;
                MigrationId::parse(&id)
                    .map(Some)
                    .map_err(|_| MigrationError::CorruptLedger { id })
            }
        }
    }

    /// Whether the schema was created by a `SchemaInit` run
    pub async fn has_schema_init(&self, conn: &mut AnyConnection) -> MigrationResult<bool> {
        let version_query = |source| MigrationError::VersionQuery { source };

        if !self.exists(conn).await.map_err(version_query)? {
            return Ok(false);
        }

        let sql = format!("SELECT id FROM {} WHERE id = {}", self.table, self.backend.placeholder(1));
        let row = sqlx::query(&sql)
            .bind(SCHEMA_INIT_ID)
            .fetch_optional(&mut *conn)
            .await
            .map_err(version_query)?;
        Ok(row.is_some())
    }

    /// Every real ledger entry, ascending by ID
    pub async fn applied(&self, conn: &mut AnyConnection) -> MigrationResult<Vec<LedgerEntry>> {
        let version_query = |source| MigrationError::VersionQuery { source };

        if !self.exists(conn).await.map_err(version_query)? {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(&self.applied_sql())
            .fetch_all(&mut *conn)
            .await
            .map_err(version_query)?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            let id: String = row.try_get("id").map_err(version_query)?;
            if id == SCHEMA_INIT_ID {
                continue;
            }
            let applied_at: String = row.try_get("applied_at").map_err(version_query)?;
            entries.push(LedgerEntry { id, applied_at });
        }

        Ok(entries)
    }

    /// Insert the row for an applied unit (inside the step's transaction)
    pub async fn record(&self, conn: &mut AnyConnection, id: &str) -> Result<(), sqlx::Error> {
        sqlx::query(&self.record_sql())
            .bind(id.to_string())
            .bind(Utc::now().to_rfc3339())
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    /// Delete the row of a rolled-back unit (inside the step's transaction)
    pub async fn remove(&self, conn: &mut AnyConnection, id: &str) -> Result<(), sqlx::Error> {
        let result = sqlx::query(&self.remove_sql())
            .bind(id.to_string())
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            tracing::warn!("migration {} had no row in {}", id, self.table);
        }
        Ok(())
    }
}

/// Reports the database's current schema version from the ledger
#[derive(Debug, Clone)]
pub struct VersionResolver {
    pool: AnyPool,
    ledger: Ledger,
}

impl VersionResolver {
    pub fn new(database: &Database, table: impl Into<String>) -> Self {
        Self {
            pool: database.pool().clone(),
            ledger: Ledger::new(table, database.backend()),
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Greatest applied migration ID, `None` for a database never migrated
    pub async fn current_version(&self) -> MigrationResult<Option<MigrationId>> {
        let mut conn = self.acquire().await?;
        self.ledger.current_version(&mut conn).await
    }

    /// Every applied migration, ascending
    pub async fn applied(&self) -> MigrationResult<Vec<LedgerEntry>> {
        let mut conn = self.acquire().await?;
        self.ledger.applied(&mut conn).await
    }

    pub async fn has_schema_init(&self) -> MigrationResult<bool> {
        let mut conn = self.acquire().await?;
        self.ledger.has_schema_init(&mut conn).await
    }

    async fn acquire(&self) -> MigrationResult<sqlx::pool::PoolConnection<sqlx::Any>> {
        self.pool
            .acquire()
            .await
            .map_err(|source| MigrationError::VersionQuery { source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders_follow_backend() {
        let pg = Ledger::new("schema_migrations", DatabaseBackendType::PostgreSQL);
        assert_eq!(
            pg.record_sql(),
            "INSERT INTO schema_migrations (id, applied_at) VALUES ($1, $2)"
        );

        let mysql = Ledger::new("schema_migrations", DatabaseBackendType::MySQL);
        assert_eq!(mysql.remove_sql(), "DELETE FROM schema_migrations WHERE id = ?");
        assert!(mysql.table_exists_sql().contains("DATABASE()"));
    }

    #[test]
    fn test_create_table_sizes_id_column() {
        let ledger = Ledger::new("blog_migrations", DatabaseBackendType::SQLite);
        assert_eq!(
            ledger.create_table_sql(),
            "CREATE TABLE IF NOT EXISTS blog_migrations (id VARCHAR(15) PRIMARY KEY, applied_at VARCHAR(64) NOT NULL)"
        );
    }
}
