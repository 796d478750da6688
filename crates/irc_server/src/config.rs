//! Ambient server configuration: identity and resource limits that the protocol itself
//! does not pin down. The listening port and connection password always come from the
//! CLI (`<port> <password>`, see `SPEC_FULL.md` §6) and are never read from here.

use serde::Deserialize;
use std::path::Path;

use crate::errors::BootstrapError;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub network: NetworkConfig,
    pub limits: LimitsConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub name: String,
    pub version: String,
    pub motd: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct NetworkConfig {
    pub bind_address: String,
    pub max_connections: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_channels_per_session: usize,
    pub max_message_length: usize,
    pub max_connections_per_ip: usize,
    pub max_topic_length: usize,
    pub unregistered_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig::default(),
            network: NetworkConfig::default(),
            limits: LimitsConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            name: "irc.localhost".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            motd: "Welcome to the IRC Network".to_string(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        NetworkConfig {
            bind_address: "0.0.0.0".to_string(),
            max_connections: 4096,
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        LimitsConfig {
            max_channels_per_session: 32,
            max_message_length: 512,
            max_connections_per_ip: 8,
            max_topic_length: 390,
            unregistered_timeout_secs: 60,
            idle_timeout_secs: 180,
        }
    }
}

impl Config {
    /// Loads configuration from `path` if it exists; falls back to built-in defaults if
    /// the file is absent. A present-but-unparsable file is a bootstrap error.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, BootstrapError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Config::default());
        }
        let content =
            std::fs::read_to_string(path).map_err(|source| BootstrapError::ConfigRead {
                path: path.display().to_string(),
                source,
            })?;
        toml::from_str(&content).map_err(|source| BootstrapError::ConfigParse {
            path: path.display().to_string(),
            source,
        })
    }
}
