//! Configuration loading and management

use crate::core::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// How active derived resolvers are scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResolverMode {
    /// All resolvers are polled at once and joined
    #[default]
    Concurrent,
    /// Resolvers run one after the other
    Sequential,
}

/// Search engine configuration
///
/// Every field has a default, so an empty YAML document is a valid
/// configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Inventory total at or above which a store carries stock over
    pub carry_over_threshold: i64,

    /// Prefix of every store's public URL; the store slug is appended
    pub public_url_base: String,

    /// Deadline for a whole search request, in milliseconds
    pub resolver_timeout_ms: u64,

    /// Page size used when the request does not give one
    pub default_limit: usize,

    /// Largest accepted page size; larger requests are capped
    pub max_limit: usize,

    pub resolver_mode: ResolverMode,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            carry_over_threshold: 10,
            public_url_base: "https://market.example.com/shops/".to_string(),
            resolver_timeout_ms: 5_000,
            default_limit: 20,
            max_limit: 100,
            resolver_mode: ResolverMode::Concurrent,
        }
    }
}

impl SearchConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConfigError::FileNotFound {
                path: path.display().to_string(),
            },
            _ => e.into(),
        })?;

        serde_yaml::from_str::<Self>(&content)
            .map_err(|e| ConfigError::ParseError {
                file: Some(path.display().to_string()),
                message: e.to_string(),
            })
            .and_then(Self::validated)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validated()
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.resolver_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "resolver_timeout_ms".to_string(),
                value: "0".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        if self.max_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_limit".to_string(),
                value: "0".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        if self.default_limit > self.max_limit {
            return Err(ConfigError::InvalidValue {
                field: "default_limit".to_string(),
                value: self.default_limit.to_string(),
                message: format!("must not exceed max_limit ({})", self.max_limit),
            });
        }
        Ok(())
    }

    fn validated(self) -> Result<Self, ConfigError> {
        self.validate()?;
        Ok(self)
    }

    pub fn resolver_timeout(&self) -> Duration {
        Duration::from_millis(self.resolver_timeout_ms)
    }

    /// Public URL of a store page
    pub fn public_url(&self, slug: &str) -> String {
        format!("{}{}", self.public_url_base, slug)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = SearchConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.resolver_timeout(), Duration::from_secs(5));
        assert_eq!(config.resolver_mode, ResolverMode::Concurrent);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = SearchConfig::from_yaml_str(
            r#"
carry_over_threshold: 50
resolver_mode: sequential
"#,
        )
        .unwrap();

        assert_eq!(config.carry_over_threshold, 50);
        assert_eq!(config.resolver_mode, ResolverMode::Sequential);
        assert_eq!(config.max_limit, 100);
    }

    #[test]
    fn test_yaml_serialization() {
        let config = SearchConfig::default();
        let yaml = serde_yaml::to_string(&config).unwrap();

        let parsed = SearchConfig::from_yaml_str(&yaml).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_invalid_limits_rejected() {
        let err = SearchConfig::from_yaml_str("default_limit: 500\nmax_limit: 100\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "default_limit"));

        let err = SearchConfig::from_yaml_str("resolver_timeout_ms: 0\n").unwrap_err();
        assert!(err.to_string().contains("resolver_timeout_ms"));
    }

    #[test]
    fn test_from_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "public_url_base: \"https://shops.test/\"").unwrap();

        let config = SearchConfig::from_yaml_file(file.path()).unwrap();
        assert_eq!(config.public_url("tea-house"), "https://shops.test/tea-house");
    }

    #[test]
    fn test_missing_file() {
        let err = SearchConfig::from_yaml_file("/nonexistent/store-search.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }
}
