/// Where a configuration value came from, reported by `status` for debugging
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Value loaded from environment variable
    EnvVar(String),
    /// Default value used
    Default(String),
    /// Value derived from other settings
    Derived(String),
}

impl ConfigSource {
    /// Resolve the source of a value backed by a single environment variable
    pub fn of_env(key: &str, default: impl Into<String>) -> Self {
        if super::env_var(key).is_some() {
            ConfigSource::EnvVar(key.to_string())
        } else {
            ConfigSource::Default(default.into())
        }
    }

    /// Check if source is environment variable
    pub fn is_env_var(&self) -> bool {
        matches!(self, ConfigSource::EnvVar(_))
    }

    /// Check if source is default value
    pub fn is_default(&self) -> bool {
        matches!(self, ConfigSource::Default(_))
    }
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::EnvVar(var) => write!(f, "environment variable {}", var),
            ConfigSource::Default(value) => write!(f, "default ({})", value),
            ConfigSource::Derived(from) => write!(f, "derived from {}", from),
        }
    }
}
