//! Configuration management for the schema registry and server
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (schemas.toml)
//! - Environment variables (SCHEMAS__*)
//!
//! ## Example config file (schemas.toml):
//! ```toml
//! [registry]
//! include_builtin = true
//! definitions = ["schemas/blog_post.json"]
//!
//! [server]
//! host = "0.0.0.0"
//! port = 8000
//!
//! [export]
//! output_format = "compact"
//! ```

use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::Result;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// Which record types to register
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Read endpoint settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Export settings
    #[serde(default)]
    pub export: ExportConfig,
}

/// Registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Register the built-in record types
    #[serde(default = "default_true")]
    pub include_builtin: bool,

    /// JSON files with additional record type definitions, loaded in order
    #[serde(default)]
    pub definitions: Vec<PathBuf>,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

/// Export configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Output format (pretty or compact)
    #[serde(default)]
    pub output_format: OutputFormat,
}

/// Output format for JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pretty,
    Compact,
}

impl OutputFormat {
    pub fn render<T: Serialize + ?Sized>(&self, value: &T) -> serde_json::Result<String> {
        match self {
            OutputFormat::Pretty => serde_json::to_string_pretty(value),
            OutputFormat::Compact => serde_json::to_string(value),
        }
    }
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            include_builtin: true,
            definitions: Vec::new(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// `host:port`, with IPv6 hosts in brackets
    pub fn socket_addr(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl SchemaConfig {
    /// Load configuration, layering a specific file over the defaults
    pub fn load_from(config_path: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_locations = ["schemas.toml", ".schemas.toml", "config/schemas.toml"];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("dev", "viewer", "schemas") {
            let xdg_config = config_dir.config_dir().join("schemas.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // SCHEMAS__SERVER__PORT=9000 etc.
        builder = builder.add_source(
            Environment::with_prefix("SCHEMAS")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let config: SchemaConfig = config.try_deserialize()?;
        tracing::debug!(?config, "configuration loaded");
        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SchemaError;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = SchemaConfig::default();
        assert!(config.registry.include_builtin);
        assert!(config.registry.definitions.is_empty());
        assert_eq!(config.server.socket_addr(), "127.0.0.1:8000");
        assert_eq!(config.export.output_format, OutputFormat::Pretty);
    }

    #[test]
    fn test_serialize_config() {
        let config = SchemaConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[registry]"));
        assert!(toml_str.contains("[server]"));
        assert!(toml_str.contains("[export]"));
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            r#"
[registry]
include_builtin = false
definitions = ["extra.json"]

[server]
port = 9100

[export]
output_format = "compact"
"#,
        )
        .unwrap();

        let config = SchemaConfig::load_from(path.to_str()).unwrap();
        assert!(!config.registry.include_builtin);
        assert_eq!(config.registry.definitions, vec![PathBuf::from("extra.json")]);
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.export.output_format, OutputFormat::Compact);
    }

    #[test]
    fn test_missing_explicit_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.toml");

        match SchemaConfig::load_from(path.to_str()) {
            Err(SchemaError::Config(_)) => {}
            other => panic!("Expected config error, got {:?}", other),
        }
    }

    #[test]
    fn test_socket_addr_brackets_ipv6() {
        let config = ServerConfig {
            host: "::1".to_string(),
            port: 8000,
        };
        assert_eq!(config.socket_addr(), "[::1]:8000");
    }

    #[test]
    fn test_save_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("saved.toml");
        let mut config = SchemaConfig::default();
        config.server.port = 8123;
        config.save(path.to_str().unwrap()).unwrap();

        let loaded = SchemaConfig::load_from(path.to_str()).unwrap();
        assert_eq!(loaded.server.port, 8123);
    }

    #[test]
    fn test_output_format_render() {
        let value = serde_json::json!({ "a": 1 });
        assert_eq!(OutputFormat::Compact.render(&value).unwrap(), r#"{"a":1}"#);
        assert!(OutputFormat::Pretty.render(&value).unwrap().contains('\n'));
    }
}
