use super::{env_or, env_parse, env_var, ConfigError, ConfigSource, ConfigValidator};
use super::{IdentifierValidator, UrlValidator};
use std::time::Duration;

/// Default ledger table name
pub const DEFAULT_MIGRATIONS_TABLE: &str = "schema_migrations";

/// Default maximum number of pooled connections
pub const DEFAULT_MAX_CONNECTIONS: u32 = 100;

/// Default bound on startup connectivity checks
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Database connection settings
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Connection URL (`postgres://`, `mysql://` or `sqlite://`)
    pub url: String,
    /// Maximum pooled connections
    pub max_connections: u32,
    /// Upper bound for establishing the first connection
    pub connect_timeout: Duration,
    /// Maximum lifetime of a pooled connection
    pub max_lifetime: Duration,
    /// Ledger table recording applied migrations
    pub migrations_table: String,
    /// Abort runs when the ledger holds migrations this build does not know
    pub strict_migrations: bool,
}

impl DatabaseConfig {
    /// Create a configuration for `url` with default pool settings
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            max_lifetime: Duration::from_secs(3600),
            migrations_table: DEFAULT_MIGRATIONS_TABLE.to_string(),
            strict_migrations: false,
        }
    }

    /// Set the maximum number of pooled connections
    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    /// Set the connectivity timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the ledger table name
    pub fn with_migrations_table(mut self, table: impl Into<String>) -> Self {
        self.migrations_table = table.into();
        self
    }

    /// Load from `DATABASE_URL`, or assemble a MySQL URL from the `MYSQL_*` variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let url = match env_var("DATABASE_URL") {
            Some(url) => url,
            None => mysql_url_from_env()?,
        };

        let config = Self {
            url,
            max_connections: env_parse(
                "DB_MAX_CONNECTIONS",
                "max_connections",
                DEFAULT_MAX_CONNECTIONS,
                "positive integer",
            )?,
            connect_timeout: Duration::from_secs(env_parse(
                "DB_CONNECT_TIMEOUT_SECS",
                "connect_timeout",
                DEFAULT_CONNECT_TIMEOUT_SECS,
                "number of seconds",
            )?),
            max_lifetime: Duration::from_secs(3600),
            migrations_table: env_or("MIGRATIONS_TABLE", DEFAULT_MIGRATIONS_TABLE),
            strict_migrations: env_parse("MIGRATIONS_STRICT", "strict_migrations", false, "true or false")?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Refuse to migrate past ledger entries unknown to this build
    pub fn with_strict_migrations(mut self, strict: bool) -> Self {
        self.strict_migrations = strict;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        UrlValidator {
            field: "database_url",
            schemes: vec!["postgres", "postgresql", "mysql", "mariadb", "sqlite"],
        }
        .validate(self.url.as_str())?;

        IdentifierValidator {
            field: "migrations_table",
            max_length: 64,
        }
        .validate(self.migrations_table.as_str())?;

        if self.max_connections == 0 {
            return Err(ConfigError::invalid_value(
                "max_connections",
                "0",
                "at least one connection",
            ));
        }

        if self.connect_timeout.is_zero() {
            return Err(ConfigError::invalid_value(
                "connect_timeout",
                "0",
                "timeout of at least one second",
            ));
        }

        Ok(())
    }

    /// Source of the connection URL
    pub fn url_source(&self) -> ConfigSource {
        if env_var("DATABASE_URL").is_some() {
            ConfigSource::EnvVar("DATABASE_URL".to_string())
        } else {
            ConfigSource::Derived("MYSQL_* variables".to_string())
        }
    }
}

fn mysql_url_from_env() -> Result<String, ConfigError> {
    let host = env_or("MYSQL_HOST", "localhost");
    let port = env_or("MYSQL_PORT", "3306");
    let username = env_or("MYSQL_USERNAME", "root");
    let password = env_or("MYSQL_PASSWORD", "root");
    let database = env_or("MYSQL_DB_NAME", "inkpost");
    let charset = env_or("MYSQL_CHARSET", "utf8mb4");

    let base = format!("mysql://{}:{}/{}", host, port, database);
    let mut url = url::Url::parse(&base)
        .map_err(|_| ConfigError::invalid_value("mysql", base.clone(), "valid MYSQL_HOST/MYSQL_PORT"))?;
    let _ = url.set_username(&username);
    let _ = url.set_password(Some(&password));
    url.query_pairs_mut().append_pair("charset", &charset);
    Ok(url.to_string())
}
