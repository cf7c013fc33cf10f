mod env;
pub mod types;
mod validation;

use std::path::Path;

pub use types::*;

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Missing environment variables: {0:?}")]
    MissingEnvVars(Vec<String>),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl MongoFsConfig {
    /// Parse a configuration from a YAML string.
    /// Environment variables in the format `${VAR_NAME}` will be interpolated.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let interpolated = env::interpolate_env(yaml)?;
        let config: MongoFsConfig = serde_yaml::from_str(&interpolated)?;
        Ok(config)
    }

    /// Load a configuration from a file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config() {
        let config = MongoFsConfig::from_yaml("{}").unwrap();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.database, "test");
        assert!(!config.field_access);
        assert_eq!(config.connect_timeout_secs, 5);
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
host: db.internal
database: inventory
field_access: true
connect_timeout_secs: 10
"#;
        let config = MongoFsConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.host, "db.internal");
        assert_eq!(config.database, "inventory");
        assert!(config.field_access);
        assert_eq!(config.connect_timeout_secs, 10);
    }

    #[test]
    fn test_parse_with_env_vars() {
        std::env::set_var("MONGOFS_TEST_HOST", "mongo.example");

        let yaml = r#"
host: ${MONGOFS_TEST_HOST}
database: test
"#;
        let config = MongoFsConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.host, "mongo.example");
    }

    #[test]
    fn test_missing_env_var_is_an_error() {
        let yaml = "host: ${MONGOFS_DEFINITELY_UNSET_VAR}";
        let err = MongoFsConfig::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVars(_)));
    }

    #[test]
    fn test_validation() {
        let config = MongoFsConfig::from_yaml("{}").unwrap();
        assert!(config.validate().is_empty());
    }
}
