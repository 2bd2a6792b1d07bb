//! Client configuration, usually loaded from a TOML file.
//!
//! ```toml
//! client_name = "thermostat"
//! async_set = true
//! debug_level = "debug2"
//! auth_key = "shared-secret"
//!
//! [endpoint]
//! unix = "/var/run/hubby.sock"
//! ```

use crate::client::ClientOptions;
use crate::debug::DebugLevel;
use crate::stream_transport::{HubStream, StreamTransport, StreamTransportError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::string::String;

pub const DEFAULT_SOCKET_PATH: &str = "/var/run/hubby.sock";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Endpoint {
    Unix(PathBuf),
    Tcp(String),
}

impl Default for Endpoint {
    fn default() -> Self {
        Endpoint::Unix(PathBuf::from(DEFAULT_SOCKET_PATH))
    }
}

impl Endpoint {
    pub fn connect(&self) -> Result<StreamTransport<HubStream>, StreamTransportError> {
        match self {
            Endpoint::Tcp(addr) => StreamTransport::connect_tcp(addr.as_str()),
            #[cfg(unix)]
            Endpoint::Unix(path) => StreamTransport::connect_unix(path),
            #[cfg(not(unix))]
            Endpoint::Unix(_) => Err(StreamTransportError::Io(std::io::Error::new(
                std::io::ErrorKind::Unsupported,
                "unix sockets are not available on this platform",
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub endpoint: Endpoint,
    #[serde(default = "default_client_name")]
    pub client_name: String,
    #[serde(default)]
    pub async_set: bool,
    #[serde(default)]
    pub debug_level: DebugLevel,
    #[serde(default)]
    pub auth_key: Option<String>,
}

fn default_client_name() -> String {
    "aflib".into()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: Endpoint::default(),
            client_name: default_client_name(),
            async_set: false,
            debug_level: DebugLevel::Off,
            auth_key: None,
        }
    }
}

impl ClientConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        log::info!(target: "aflib", "Loading configuration: {:?}", path);
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn options(&self) -> ClientOptions {
        ClientOptions {
            client_name: self.client_name.clone(),
            auth_key: self.auth_key.as_ref().map(|key| key.as_bytes().to_vec()),
            async_set: self.async_set,
            debug_level: self.debug_level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::from_toml_str("").unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(
            config.endpoint,
            Endpoint::Unix(PathBuf::from("/var/run/hubby.sock"))
        );
        assert_eq!(config.client_name, "aflib");
        assert!(!config.async_set);
        assert_eq!(config.debug_level, DebugLevel::Off);
    }

    #[test]
    fn test_full_config() {
        let config = ClientConfig::from_toml_str(
            r#"
            client_name = "thermostat"
            async_set = true
            debug_level = "debug3"
            auth_key = "s3cret"

            [endpoint]
            tcp = "127.0.0.1:7010"
            "#,
        )
        .unwrap();

        assert_eq!(config.endpoint, Endpoint::Tcp("127.0.0.1:7010".into()));
        let options = config.options();
        assert_eq!(options.client_name, "thermostat");
        assert!(options.async_set);
        assert_eq!(options.debug_level, DebugLevel::Debug3);
        assert_eq!(options.auth_key.as_deref(), Some(&b"s3cret"[..]));
    }

    #[test]
    fn test_unknown_debug_level_is_rejected() {
        assert!(matches!(
            ClientConfig::from_toml_str(r#"debug_level = "verbose""#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "client_name = \"from-file\"").unwrap();
        let config = ClientConfig::load(file.path()).unwrap();
        assert_eq!(config.client_name, "from-file");
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        match ClientConfig::load(&missing) {
            Err(ConfigError::Io { path, .. }) => assert_eq!(path, missing),
            other => panic!("expected Io error, got {:?}", other),
        }
    }
}
