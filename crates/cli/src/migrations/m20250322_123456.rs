use anyhow::Context;
use inkpost_db::migrations::execute_script;
use inkpost_db::{async_trait, AnyConnection, DatabaseBackendType, Migration};

/// Article view and like counters
pub struct M20250322123456;

const TABLES: [&str; 2] = ["view_records", "like_records"];

fn create_table_sql(backend: DatabaseBackendType, table: &str) -> String {
    let (id, timestamp) = match backend {
        DatabaseBackendType::PostgreSQL => ("id BIGSERIAL PRIMARY KEY", "TIMESTAMPTZ"),
        DatabaseBackendType::MySQL => ("id BIGINT AUTO_INCREMENT PRIMARY KEY", "DATETIME(3)"),
        DatabaseBackendType::SQLite => ("id INTEGER PRIMARY KEY AUTOINCREMENT", "DATETIME"),
    };

    format!(
        "CREATE TABLE {table} (\
            {id}, \
            ip VARCHAR(64) NOT NULL, \
            article_id VARCHAR(128) NOT NULL, \
            creator VARCHAR(32) NULL, \
            updater VARCHAR(32) NULL, \
            created_at {timestamp}, \
            updated_at {timestamp}\
        )"
    )
}

#[async_trait]
impl Migration for M20250322123456 {
    fn id(&self) -> &str {
        // Do not edit the migration ID
        "20250322_123456"
    }

    fn description(&self) -> &str {
        "create view_records and like_records"
    }

    async fn up(&self, conn: &mut AnyConnection) -> anyhow::Result<()> {
        let backend = DatabaseBackendType::of(conn).context("unsupported database backend")?;
        for table in TABLES {
            sqlx::query(&create_table_sql(backend, table))
                .execute(&mut *conn)
                .await
                .with_context(|| format!("failed to create {}", table))?;
        }
        Ok(())
    }

    async fn down(&self, conn: &mut AnyConnection) -> anyhow::Result<()> {
        execute_script(conn, "DROP TABLE like_records; DROP TABLE view_records;").await
    }
}
