use thiserror::Error;

/// Configuration error type
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for field '{field}': '{value}'. Expected: {expected}")]
    InvalidValue {
        field: String,
        value: String,
        expected: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    /// Create an invalid value error
    pub fn invalid_value(
        field: impl Into<String>,
        value: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.into(),
            expected: expected.into(),
        }
    }
}

/// Trait for validating configuration values
pub trait ConfigValidator<T: ?Sized> {
    /// Validate a configuration value
    fn validate(&self, value: &T) -> Result<(), ConfigError>;
}

/// Accepts plain SQL identifiers (`[A-Za-z_][A-Za-z0-9_]*`) up to `max_length` bytes.
///
/// Table names end up interpolated into DDL, so anything needing quoting is refused.
pub struct IdentifierValidator {
    pub field: &'static str,
    pub max_length: usize,
}

impl ConfigValidator<str> for IdentifierValidator {
    fn validate(&self, value: &str) -> Result<(), ConfigError> {
        let mut chars = value.chars();
        let head_ok = chars
            .next()
            .map_or(false, |c| c.is_ascii_alphabetic() || c == '_');
        let tail_ok = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

        if !head_ok || !tail_ok || value.len() > self.max_length {
            return Err(ConfigError::invalid_value(
                self.field,
                value,
                format!(
                    "SQL identifier of letters, digits and underscores (max {} chars)",
                    self.max_length
                ),
            ));
        }
        Ok(())
    }
}

/// Accepts URLs whose scheme is in `schemes`
pub struct UrlValidator {
    pub field: &'static str,
    pub schemes: Vec<&'static str>,
}

impl ConfigValidator<str> for UrlValidator {
    fn validate(&self, value: &str) -> Result<(), ConfigError> {
        let parsed = url::Url::parse(value).map_err(|e| {
            ConfigError::invalid_value(self.field, redact_url(value), format!("valid URL ({})", e))
        })?;

        if !self.schemes.contains(&parsed.scheme()) {
            return Err(ConfigError::invalid_value(
                self.field,
                redact_url(value),
                format!("URL with scheme: {}", self.schemes.join(", ")),
            ));
        }
        Ok(())
    }
}

/// Log level validator
pub struct LogLevelValidator;

impl LogLevelValidator {
    pub const LEVELS: [&'static str; 5] = ["error", "warn", "info", "debug", "trace"];
}

impl ConfigValidator<str> for LogLevelValidator {
    fn validate(&self, value: &str) -> Result<(), ConfigError> {
        if !Self::LEVELS.contains(&value) {
            return Err(ConfigError::invalid_value(
                "log_level",
                value,
                format!("one of: {}", Self::LEVELS.join(", ")),
            ));
        }
        Ok(())
    }
}

/// Replace the password of a connection URL with `***` so it can be logged.
///
/// Strings that do not parse as URLs are returned unchanged.
pub fn redact_url(raw: &str) -> String {
    match url::Url::parse(raw) {
        Ok(mut parsed) if parsed.password().is_some() => {
            let _ = parsed.set_password(Some("***"));
            parsed.to_string()
        }
        _ => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_validator() {
        let validator = IdentifierValidator {
            field: "migrations_table",
            max_length: 64,
        };

        assert!(validator.validate("schema_migrations").is_ok());
        assert!(validator.validate("_ledger2").is_ok());
        assert!(validator.validate("").is_err());
        assert!(validator.validate("2fast").is_err());
        assert!(validator.validate("drop table; --").is_err());
        assert!(validator.validate(&"x".repeat(65)).is_err());
    }

    #[test]
    fn test_url_validator() {
        let validator = UrlValidator {
            field: "database_url",
            schemes: vec!["postgres", "mysql", "sqlite"],
        };

        assert!(validator.validate("postgres://localhost/inkpost").is_ok());
        assert!(validator.validate("sqlite://data.db").is_ok());
        assert!(validator.validate("redis://localhost").is_err());
        assert!(validator.validate("not a url").is_err());
    }

    #[test]
    fn test_redact_url_hides_password() {
        let redacted = redact_url("mysql://root:secret@db:3306/inkpost");
        assert!(!redacted.contains("secret"));
        assert!(redacted.contains("root:***@db:3306"));

        assert_eq!(redact_url("sqlite://blog.db"), "sqlite://blog.db");
    }
}
