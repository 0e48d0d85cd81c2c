//! Default configuration values
//!
//! Single source of truth for defaults used by `ListenerConfig::default()`,
//! serde and the command line.

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use super::types::{ClientCertMode, LogMode};

/// Environment variable prefix for all configuration options
pub const ENV_PREFIX: &str = "SECURE_LISTENER";

/// Environment variable naming an optional JSON configuration file
pub const CONFIG_FILE_ENV: &str = "SECURE_LISTENER_CONFIG_FILE";

/// Suffix of the per-session transcript
pub const LOG_SUFFIX: &str = ".out";

/// Chunks the line tap holds before the inbound pump waits for the transcript
pub const TAP_CAPACITY: usize = 64;

/// Default log level as string
pub const LOG_LEVEL_STR: &str = "info";

/// Default bind address
pub fn bind_address() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

/// Default directory for session transcripts
pub fn log_dir() -> PathBuf {
    PathBuf::from(".")
}

/// Default log level
pub fn log_level() -> String {
    LOG_LEVEL_STR.to_string()
}

/// Default transcript open mode
pub fn log_mode() -> LogMode {
    LogMode::Overwrite
}

/// Default pump buffer size (8KB)
pub fn buffer_size() -> usize {
    8192
}

/// Default client certificate mode
///
/// Trust is transport-level only unless asked otherwise.
pub fn client_cert_mode() -> ClientCertMode {
    ClientCertMode::None
}
