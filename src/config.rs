//! Configuration management for the warden gateway.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, WardenError};
use crate::token;

/// Main configuration for the gateway.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WardenConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Admission-control configuration
    #[serde(default)]
    pub protection: ProtectionConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the gateway listens on
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,

    /// URL of the real XML-RPC handler requests are forwarded to
    #[serde(default = "default_upstream_url")]
    pub upstream_url: String,

    /// Directory holding the counter snapshot and audit log
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            upstream_url: default_upstream_url(),
            data_dir: default_data_dir(),
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    "0.0.0.0:8080".parse().expect("static address")
}

fn default_upstream_url() -> String {
    "http://127.0.0.1:8008/xmlrpc".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

/// Admission-control configuration, read-only per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtectionConfig {
    /// Shared-secret token callers must present. Empty means unconfigured;
    /// a token is auto-provisioned at load time.
    #[serde(default)]
    pub token: String,

    /// Requests allowed per IP per minute. 0 rejects everything.
    #[serde(default = "default_limit_per_minute")]
    pub limit_per_minute: u32,

    /// Newline-separated IP whitelist. Empty disables the check.
    #[serde(default)]
    pub whitelist: String,

    /// On an invalid token, redirect to loopback instead of surfacing an
    /// error.
    #[serde(default)]
    pub redirect_on_invalid_token: bool,
}

impl Default for ProtectionConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            limit_per_minute: default_limit_per_minute(),
            whitelist: String::new(),
            redirect_on_invalid_token: false,
        }
    }
}

fn default_limit_per_minute() -> u32 {
    30
}

impl ProtectionConfig {
    /// Whitelist entries: newline-split, trimmed, empty lines dropped.
    pub fn whitelist_entries(&self) -> Vec<String> {
        self.whitelist
            .lines()
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(str::to_string)
            .collect()
    }
}

impl WardenConfig {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&contents)
            .map_err(|e| WardenError::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// Load configuration, falling back to defaults when the file is
    /// missing or unparseable, and auto-provision a token if none is
    /// configured.
    ///
    /// The fallback is fail-closed: a freshly generated token denies every
    /// caller until the operator configures one.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let mut config = match path {
            Some(path) => match Self::from_file(path) {
                Ok(config) => config,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Falling back to default configuration");
                    Self::default()
                }
            },
            None => Self::default(),
        };

        if config.protection.token.is_empty() {
            config.protection.token = token::generate(token::DEFAULT_LENGTH);
            info!(
                token = %config.protection.token,
                "No token configured, auto-provisioned one"
            );
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WardenConfig::default();
        assert_eq!(config.protection.limit_per_minute, 30);
        assert!(config.protection.token.is_empty());
        assert!(config.protection.whitelist_entries().is_empty());
        assert!(!config.protection.redirect_on_invalid_token);
        assert_eq!(config.server.bind_addr.port(), 8080);
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
server:
  bind_addr: 127.0.0.1:9000
  upstream_url: http://10.1.1.1:80/xmlrpc
protection:
  token: abc123
  limit_per_minute: 5
  whitelist: "10.0.0.1\n10.0.0.2"
  redirect_on_invalid_token: true
"#;
        let config: WardenConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.protection.token, "abc123");
        assert_eq!(config.protection.limit_per_minute, 5);
        assert_eq!(config.protection.whitelist_entries(), vec!["10.0.0.1", "10.0.0.2"]);
        assert!(config.protection.redirect_on_invalid_token);
        assert_eq!(config.server.upstream_url, "http://10.1.1.1:80/xmlrpc");
    }

    #[test]
    fn test_non_numeric_limit_fails_parse() {
        let yaml = r#"
protection:
  limit_per_minute: lots
"#;
        assert!(serde_yaml::from_str::<WardenConfig>(yaml).is_err());
    }

    #[test]
    fn test_whitelist_entries_trimmed_and_filtered() {
        let protection = ProtectionConfig {
            whitelist: "  10.0.0.1  \n\n 192.168.1.5\n".to_string(),
            ..ProtectionConfig::default()
        };
        assert_eq!(protection.whitelist_entries(), vec!["10.0.0.1", "192.168.1.5"]);
    }

    #[test]
    fn test_load_or_default_provisions_token() {
        let config = WardenConfig::load_or_default(None);
        assert_eq!(config.protection.token.len(), token::DEFAULT_LENGTH);
    }

    #[test]
    fn test_load_or_default_with_missing_file() {
        let path = std::env::temp_dir().join(format!("warden-missing-{}.yaml", uuid::Uuid::new_v4()));
        let config = WardenConfig::load_or_default(Some(&path));
        assert_eq!(config.protection.limit_per_minute, 30);
        assert!(!config.protection.token.is_empty());
    }

    #[test]
    fn test_load_or_default_keeps_configured_token() {
        let path = std::env::temp_dir().join(format!("warden-cfg-{}.yaml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "protection:\n  token: abc123\n").unwrap();
        let config = WardenConfig::load_or_default(Some(&path));
        assert_eq!(config.protection.token, "abc123");
        let _ = std::fs::remove_file(&path);
    }
}
