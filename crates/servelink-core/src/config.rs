//! Client configuration

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default number of attempts before giving up
pub const DEFAULT_N_TRIES: u32 = 3;

/// Default per-attempt deadline in seconds
pub const DEFAULT_CALL_TIMEOUT_SECS: u64 = 5;

/// Client configuration
///
/// One gRPC connection pair is opened to each address the `host` name
/// resolves to; membership follows DNS on every call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Backend hostname. May resolve to multiple addresses.
    pub host: String,
    /// Backend port, shared by all resolved addresses
    pub port: u16,
    /// Number of attempts before giving up on a prediction
    #[serde(default = "default_n_tries")]
    pub n_tries: u32,
    /// Per-attempt deadline in seconds
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,
    /// Path to a PEM CA certificate. Absent means plaintext transport.
    #[serde(default)]
    pub ca_pem_file: Option<PathBuf>,
    /// Channel options passed through to the transport layer
    #[serde(default)]
    pub channel_options: BTreeMap<String, String>,
}

fn default_n_tries() -> u32 {
    DEFAULT_N_TRIES
}

fn default_call_timeout_secs() -> u64 {
    DEFAULT_CALL_TIMEOUT_SECS
}

impl ClientConfig {
    /// Create a configuration with default retry and timeout settings
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            n_tries: DEFAULT_N_TRIES,
            call_timeout_secs: DEFAULT_CALL_TIMEOUT_SECS,
            ca_pem_file: None,
            channel_options: BTreeMap::new(),
        }
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &std::path::Path) -> Result<Self, crate::ClientError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::ClientError::Config(format!("Failed to read config file: {}", e))
        })?;
        toml::from_str(&content)
            .map_err(|e| crate::ClientError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Per-attempt deadline as a duration
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::new("serving.internal", 8500);
        assert_eq!(config.n_tries, 3);
        assert_eq!(config.call_timeout(), Duration::from_secs(5));
        assert!(config.ca_pem_file.is_none());
        assert!(config.channel_options.is_empty());
    }

    #[test]
    fn test_from_file() {
        let toml_str = r#"
host = "serving.internal"
port = 8500
n_tries = 5

[channel_options]
connect_timeout_ms = "2000"
"#;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(toml_str.as_bytes()).unwrap();

        let config = ClientConfig::from_file(file.path()).unwrap();
        assert_eq!(config.host, "serving.internal");
        assert_eq!(config.port, 8500);
        assert_eq!(config.n_tries, 5);
        assert_eq!(config.call_timeout_secs, DEFAULT_CALL_TIMEOUT_SECS);
        assert_eq!(
            config.channel_options.get("connect_timeout_ms").unwrap(),
            "2000"
        );
    }

    #[test]
    fn test_from_file_missing() {
        let err = ClientConfig::from_file(std::path::Path::new("/nonexistent.toml")).unwrap_err();
        assert!(matches!(err, crate::ClientError::Config(_)));
    }
}
