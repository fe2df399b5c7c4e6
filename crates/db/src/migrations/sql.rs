//! Raw-SQL migration units

use anyhow::Context;
use async_trait::async_trait;
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;
use sqlx::AnyConnection;

use super::definitions::Migration;

/// Migration whose forward and backward operations are plain SQL scripts
#[derive(Debug, Clone)]
pub struct SqlMigration {
    id: String,
    description: String,
    up_sql: String,
    down_sql: String,
}

impl SqlMigration {
    pub fn new(id: impl Into<String>, up_sql: impl Into<String>, down_sql: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: String::new(),
            up_sql: up_sql.into(),
            down_sql: down_sql.into(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

#[async_trait]
impl Migration for SqlMigration {
    fn id(&self) -> &str {
        &self.id
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn up(&self, conn: &mut AnyConnection) -> anyhow::Result<()> {
        execute_script(conn, &self.up_sql).await
    }

    async fn down(&self, conn: &mut AnyConnection) -> anyhow::Result<()> {
        execute_script(conn, &self.down_sql).await
    }
}

/// Run every statement of `sql` in order on `conn`
pub async fn execute_script(conn: &mut AnyConnection, sql: &str) -> anyhow::Result<()> {
    for statement in split_sql_statements(sql) {
        tracing::debug!("executing: {}", statement);
        sqlx::query(&statement)
            .execute(&mut *conn)
            .await
            .with_context(|| format!("statement failed: {}", statement))?;
    }
    Ok(())
}

/// Split a script into individual statements.
///
/// Uses a real SQL parser; scripts it cannot parse (vendor-specific syntax)
/// fall back to splitting on semicolons.
pub fn split_sql_statements(sql: &str) -> Vec<String> {
    if sql.trim().is_empty() {
        return Vec::new();
    }

    let dialect = GenericDialect {};
    match Parser::parse_sql(&dialect, sql) {
        Ok(parsed_statements) => parsed_statements
            .into_iter()
            .map(|stmt| stmt.to_string())
            .collect(),
        Err(e) => {
            tracing::warn!("SQL parsing failed, using naive semicolon splitting: {}", e);
            sql.split(';')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_parsed_statements() {
        let statements = split_sql_statements(
            "CREATE TABLE posts (id INTEGER PRIMARY KEY, title VARCHAR(255));\n\
             CREATE INDEX idx_posts_title ON posts (title);",
        );
        assert_eq!(statements.len(), 2);
        assert!(statements[0].starts_with("CREATE TABLE posts"));
        assert!(statements[1].starts_with("CREATE INDEX idx_posts_title"));
    }

    #[test]
    fn test_split_falls_back_on_unparseable_sql() {
        let statements = split_sql_statements("FROBNICATE posts; FROBNICATE comments;");
        assert_eq!(statements, vec!["FROBNICATE posts", "FROBNICATE comments"]);
    }

    #[test]
    fn test_split_empty_script() {
        assert!(split_sql_statements("  \n ").is_empty());
    }
}
