//! Database connection management
//!
//! Wraps a sqlx `AnyPool` so the backend is picked from the URL at runtime.
//! Establishing the pool is bounded by the configured connect timeout: an
//! unreachable database fails fast instead of hanging startup.

use inkpost_core::config::{redact_url, DatabaseConfig};
use sqlx::any::AnyPoolOptions;
use sqlx::{AnyConnection, AnyPool, Connection};
use std::time::{Duration, Instant};

use crate::error::ConnectivityError;

/// Database backend type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatabaseBackendType {
    PostgreSQL,
    MySQL,
    SQLite,
}

impl DatabaseBackendType {
    /// Backend selected by a connection URL's scheme
    pub fn from_url(url: &str) -> Result<Self, ConnectivityError> {
        let scheme = url.split(':').next().unwrap_or_default();
        scheme.parse().map_err(|_| ConnectivityError::UnsupportedBackend {
            scheme: scheme.to_string(),
        })
    }

    /// Backend of an open connection
    pub fn of(conn: &AnyConnection) -> Option<Self> {
        conn.backend_name().parse().ok()
    }

    /// Bind placeholder for the `n`-th (1-based) parameter
    pub fn placeholder(&self, n: usize) -> String {
        match self {
            DatabaseBackendType::PostgreSQL => format!("${}", n),
            DatabaseBackendType::MySQL | DatabaseBackendType::SQLite => "?".to_string(),
        }
    }
}

impl std::fmt::Display for DatabaseBackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatabaseBackendType::PostgreSQL => write!(f, "postgresql"),
            DatabaseBackendType::MySQL => write!(f, "mysql"),
            DatabaseBackendType::SQLite => write!(f, "sqlite"),
        }
    }
}

impl std::str::FromStr for DatabaseBackendType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgresql" | "postgres" => Ok(DatabaseBackendType::PostgreSQL),
            "mysql" | "mariadb" => Ok(DatabaseBackendType::MySQL),
            "sqlite" => Ok(DatabaseBackendType::SQLite),
            _ => Err(format!("Unsupported database backend: {}", s)),
        }
    }
}

/// Connected database handle; cheap to clone
#[derive(Clone, Debug)]
pub struct Database {
    pool: AnyPool,
    backend: DatabaseBackendType,
    endpoint: String,
}

impl Database {
    /// Connect and verify the database answers, within `config.connect_timeout`
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, ConnectivityError> {
        let backend = DatabaseBackendType::from_url(&config.url)?;
        let endpoint = redact_url(&config.url);
        sqlx::any::install_default_drivers();

        let options = AnyPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.connect_timeout)
            .max_lifetime(config.max_lifetime);

        let timeout = config.connect_timeout;
        let pool = match tokio::time::timeout(timeout, options.connect(&config.url)).await {
            Ok(Ok(pool)) => pool,
            Ok(Err(source)) => return Err(unreachable_or_timeout(endpoint, timeout, source)),
            Err(_) => return Err(ConnectivityError::Timeout { endpoint, timeout }),
        };

        let database = Self {
            pool,
            backend,
            endpoint,
        };
        let elapsed = database.ping(timeout).await?;
        tracing::info!("database {} connected ({:?})", database.endpoint, elapsed);

        Ok(database)
    }

    /// Round-trip a trivial query, bounded by `timeout`
    pub async fn ping(&self, timeout: Duration) -> Result<Duration, ConnectivityError> {
        let start = Instant::now();
        let check = async {
            let mut conn = self.pool.acquire().await?;
            conn.ping().await
        };

        match tokio::time::timeout(timeout, check).await {
            Ok(Ok(())) => Ok(start.elapsed()),
            Ok(Err(source)) => Err(unreachable_or_timeout(self.endpoint.clone(), timeout, source)),
            Err(_) => Err(ConnectivityError::Timeout {
                endpoint: self.endpoint.clone(),
                timeout,
            }),
        }
    }

    /// Get the connection pool
    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    pub fn backend(&self) -> DatabaseBackendType {
        self.backend
    }

    /// Connection URL with the password redacted
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Close every pooled connection
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn unreachable_or_timeout(endpoint: String, timeout: Duration, source: sqlx::Error) -> ConnectivityError {
    match source {
        sqlx::Error::PoolTimedOut => ConnectivityError::Timeout { endpoint, timeout },
        source => ConnectivityError::Unreachable { endpoint, source },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_from_url() {
        assert_eq!(
            DatabaseBackendType::from_url("postgres://localhost/inkpost").unwrap(),
            DatabaseBackendType::PostgreSQL
        );
        assert_eq!(
            DatabaseBackendType::from_url("mysql://root@localhost/inkpost").unwrap(),
            DatabaseBackendType::MySQL
        );
        assert_eq!(
            DatabaseBackendType::from_url("sqlite::memory:").unwrap(),
            DatabaseBackendType::SQLite
        );
        assert!(matches!(
            DatabaseBackendType::from_url("oracle://db/inkpost"),
            Err(ConnectivityError::UnsupportedBackend { ref scheme }) if scheme == "oracle"
        ));
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(DatabaseBackendType::PostgreSQL.placeholder(2), "$2");
        assert_eq!(DatabaseBackendType::MySQL.placeholder(2), "?");
        assert_eq!(DatabaseBackendType::SQLite.placeholder(1), "?");
    }
}
