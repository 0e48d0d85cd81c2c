//! Configuration loading functionality
//!
//! Sources are layered with the `config` crate, lowest priority first:
//! 1. Default values (serde defaults on `ListenerConfig`)
//! 2. JSON configuration file, when one is named
//! 3. Environment variables prefixed with `SECURE_LISTENER_`
//! 4. Command line arguments, applied afterwards with [`ListenerConfig::merge`]

use ::config::{Config, Environment, File, FileFormat};
use log::debug;
use std::net::IpAddr;
use std::path::{Path, PathBuf};

use super::defaults::{CONFIG_FILE_ENV, ENV_PREFIX};
use super::error::Result;
use super::types::{ClientCertMode, ListenerConfig, LogMode};

/// Values given on the command line
///
/// `None` means "not given", so lower-priority sources stay in effect.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub keystore: Option<PathBuf>,
    pub port: Option<u16>,
    pub bind_address: Option<IpAddr>,
    pub log_dir: Option<PathBuf>,
    pub log_mode: Option<LogMode>,
    pub log_level: Option<String>,
    pub buffer_size: Option<usize>,
    pub client_cert_mode: Option<ClientCertMode>,
}

impl ListenerConfig {
    /// Load configuration from defaults, an optional file and the environment
    ///
    /// When `config_file` is `None` the path in `SECURE_LISTENER_CONFIG_FILE`
    /// is used if set. A named file must exist.
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let env_file = std::env::var(CONFIG_FILE_ENV).ok().map(PathBuf::from);
        let file = config_file.map(Path::to_path_buf).or(env_file);

        let mut builder = Config::builder();
        if let Some(path) = &file {
            debug!("Loading configuration file {}", path.display());
            builder = builder.add_source(
                File::new(&path.to_string_lossy(), FileFormat::Json).required(true),
            );
        }
        builder = builder.add_source(Environment::with_prefix(ENV_PREFIX));

        let config = builder.build()?.try_deserialize::<Self>()?;
        Ok(config)
    }

    /// Apply command line values on top of this configuration
    pub fn merge(mut self, overrides: CliOverrides) -> Self {
        if let Some(keystore) = overrides.keystore {
            self.keystore = keystore;
        }
        if let Some(port) = overrides.port {
            self.port = port;
        }
        if let Some(bind_address) = overrides.bind_address {
            self.bind_address = bind_address;
        }
        if let Some(log_dir) = overrides.log_dir {
            self.log_dir = log_dir;
        }
        if let Some(log_mode) = overrides.log_mode {
            self.log_mode = log_mode;
        }
        if let Some(log_level) = overrides.log_level {
            self.log_level = log_level;
        }
        if let Some(buffer_size) = overrides.buffer_size {
            self.buffer_size = buffer_size;
        }
        if let Some(client_cert_mode) = overrides.client_cert_mode {
            self.client_cert_mode = client_cert_mode;
        }
        self
    }
}
