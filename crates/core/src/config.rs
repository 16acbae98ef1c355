//! Configuration types shared across crates.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Server configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Local staging directory for chunk reassembly during downloads.
    #[serde(default = "default_staging_dir")]
    pub staging_dir: PathBuf,
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_staging_dir() -> PathBuf {
    PathBuf::from("staging")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            staging_dir: default_staging_dir(),
        }
    }
}

/// Blob transport configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransportConfig {
    /// Local filesystem channel (one directory per channel).
    Filesystem {
        /// Root directory for channel objects.
        path: PathBuf,
        /// Hard per-object size ceiling in bytes.
        #[serde(default = "default_max_object_size")]
        max_object_size: u64,
    },
}

fn default_max_object_size() -> u64 {
    crate::DEFAULT_MAX_OBJECT_SIZE
}

impl TransportConfig {
    /// The configured per-object size ceiling.
    pub fn max_object_size(&self) -> u64 {
        match self {
            Self::Filesystem {
                max_object_size, ..
            } => *max_object_size,
        }
    }

    /// Validate the configuration, returning an error message on failure.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_object_size() == 0 {
            return Err("transport.max_object_size must be greater than zero".to_string());
        }
        Ok(())
    }
}

/// Metadata store configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MetadataConfig {
    /// SQLite database file.
    Sqlite {
        /// Path to the database file.
        path: PathBuf,
    },
}

/// Top-level application configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub transport: TransportConfig,
    pub metadata: MetadataConfig,
    /// Name of the transport channel that carries chunk payloads.
    #[serde(default = "default_channel")]
    pub channel: String,
}

fn default_channel() -> String {
    "shelf".to_string()
}

impl AppConfig {
    /// Create a test configuration rooted at the given directory.
    ///
    /// **For testing only.**
    pub fn for_testing(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            server: ServerConfig {
                bind: "127.0.0.1:0".to_string(),
                staging_dir: root.join("staging"),
            },
            transport: TransportConfig::Filesystem {
                path: root.join("channel"),
                max_object_size: crate::DEFAULT_MAX_OBJECT_SIZE,
            },
            metadata: MetadataConfig::Sqlite {
                path: root.join("metadata.db"),
            },
            channel: "test".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_toml_sections() {
        let config: AppConfig = toml_from_str(
            r#"
            [transport]
            type = "filesystem"
            path = "/var/lib/shelf/channel"

            [metadata]
            type = "sqlite"
            path = "/var/lib/shelf/metadata.db"
            "#,
        );
        assert_eq!(config.server.bind, "127.0.0.1:8080");
        assert_eq!(config.channel, "shelf");
        assert_eq!(
            config.transport.max_object_size(),
            crate::DEFAULT_MAX_OBJECT_SIZE
        );
    }

    #[test]
    fn test_zero_object_size_rejected() {
        let transport = TransportConfig::Filesystem {
            path: "/tmp/x".into(),
            max_object_size: 0,
        };
        assert!(transport.validate().is_err());
    }

    fn toml_from_str(s: &str) -> AppConfig {
        toml::from_str(s).expect("config should parse")
    }
}
