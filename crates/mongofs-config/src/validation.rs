use crate::types::MongoFsConfig;
use crate::ConfigError;

impl MongoFsConfig {
    /// Validate the configuration and return a list of errors.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.host.trim().is_empty() {
            errors.push(ConfigError::InvalidConfig(
                "host must not be empty".to_string(),
            ));
        }

        if self.database.trim().is_empty() {
            errors.push(ConfigError::InvalidConfig(
                "database must not be empty".to_string(),
            ));
        }

        // MongoDB rejects these characters in database names.
        if self
            .database
            .chars()
            .any(|c| matches!(c, '/' | '\\' | '.' | ' ' | '"' | '$'))
        {
            errors.push(ConfigError::InvalidConfig(format!(
                "database name '{}' contains invalid characters",
                self.database
            )));
        }

        if self.connect_timeout_secs == 0 {
            errors.push(ConfigError::InvalidConfig(
                "connect_timeout_secs must be at least 1".to_string(),
            ));
        }

        errors
    }

    /// Validate and return Ok(()) if valid, or Err with the first error.
    pub fn validate_or_err(&self) -> Result<(), ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors.into_iter().next().unwrap())
        }
    }
}
