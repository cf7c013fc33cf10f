use serde::{Deserialize, Serialize};

/// Top-level configuration for a mongofs mount.
///
/// All fields are resolved once at startup; the configuration is not
/// reloadable while mounted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MongoFsConfig {
    /// MongoDB server host.
    #[serde(default = "default_host")]
    pub host: String,

    /// Database name to expose at the filesystem root.
    #[serde(default = "default_database")]
    pub database: String,

    /// Enable the 4-segment grammar: documents become directories of
    /// field files. Off by default (documents are leaf files).
    #[serde(default)]
    pub field_access: bool,

    /// Bound on connection establishment and server selection.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_database() -> String {
    "test".to_string()
}

fn default_connect_timeout() -> u64 {
    5
}

impl Default for MongoFsConfig {
    fn default() -> Self {
        MongoFsConfig {
            host: default_host(),
            database: default_database(),
            field_access: false,
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl MongoFsConfig {
    /// Connection string for the configured host.
    pub fn connection_uri(&self) -> String {
        if self.host.contains("://") {
            self.host.clone()
        } else {
            format!("mongodb://{}", self.host)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MongoFsConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.database, "test");
        assert!(!config.field_access);
    }

    #[test]
    fn test_connection_uri_bare_host() {
        let config = MongoFsConfig {
            host: "db1:27017".to_string(),
            ..Default::default()
        };
        assert_eq!(config.connection_uri(), "mongodb://db1:27017");
    }

    #[test]
    fn test_connection_uri_full_scheme_passthrough() {
        let config = MongoFsConfig {
            host: "mongodb+srv://cluster0.example".to_string(),
            ..Default::default()
        };
        assert_eq!(config.connection_uri(), "mongodb+srv://cluster0.example");
    }
}
