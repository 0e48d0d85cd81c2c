//! Configuration types
//!
//! This module contains the main configuration types used throughout the application.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use super::defaults;
use super::error::ConfigError;
use crate::common::listen_addr;

/// Client certificate verification mode
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClientCertMode {
    /// Require client certificate, connection fails if not provided
    Required,
    /// Verify the client certificate if provided but don't require it
    Optional,
    /// Don't verify client certificates
    #[default]
    None,
}

impl std::fmt::Display for ClientCertMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientCertMode::Required => write!(f, "required"),
            ClientCertMode::Optional => write!(f, "optional"),
            ClientCertMode::None => write!(f, "none"),
        }
    }
}

impl FromStr for ClientCertMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "required" => Ok(Self::Required),
            "optional" => Ok(Self::Optional),
            "none" => Ok(Self::None),
            _ => Err(ConfigError::InvalidValue(
                "client_cert_mode".to_string(),
                format!("Invalid client certificate mode: {}. Valid values are: required, optional, none", s)
            )),
        }
    }
}

/// How the session transcript is opened when it already exists
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogMode {
    /// Truncate any transcript left by a previous run
    #[default]
    Overwrite,
    /// Keep previous content and add to the end
    Append,
}

impl std::fmt::Display for LogMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogMode::Overwrite => write!(f, "overwrite"),
            LogMode::Append => write!(f, "append"),
        }
    }
}

impl FromStr for LogMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "overwrite" => Ok(Self::Overwrite),
            "append" => Ok(Self::Append),
            _ => Err(ConfigError::InvalidValue(
                "log_mode".to_string(),
                format!("Invalid log mode: {}. Valid values are: overwrite, append", s)
            )),
        }
    }
}

/// Listener configuration
///
/// Every field has a default so partial sources (a JSON file, a handful of
/// environment variables) deserialize cleanly; `keystore` and `port` have no
/// meaningful default and are checked by the validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// PKCS#12 credential store holding the server identity
    pub keystore: PathBuf,

    /// TCP port to listen on
    pub port: u16,

    /// Interface address to listen on
    pub bind_address: IpAddr,

    /// Directory receiving the session transcript
    pub log_dir: PathBuf,

    /// Transcript open mode
    pub log_mode: LogMode,

    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,

    /// Pump buffer size in bytes
    pub buffer_size: usize,

    /// Client certificate verification mode
    pub client_cert_mode: ClientCertMode,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            keystore: PathBuf::new(),
            port: 0,
            bind_address: defaults::bind_address(),
            log_dir: defaults::log_dir(),
            log_mode: defaults::log_mode(),
            log_level: defaults::log_level(),
            buffer_size: defaults::buffer_size(),
            client_cert_mode: defaults::client_cert_mode(),
        }
    }
}

impl ListenerConfig {
    /// Socket address the listener binds
    pub fn listen_addr(&self) -> SocketAddr {
        listen_addr(self.bind_address, self.port)
    }
}
