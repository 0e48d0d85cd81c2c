//! Configuration module
//!
//! Layered listener configuration: defaults, JSON file, environment, command line.

pub mod defaults;
pub mod error;
pub mod loader;
pub mod types;
pub mod validator;

pub use defaults::{CONFIG_FILE_ENV, ENV_PREFIX, LOG_SUFFIX};
pub use error::ConfigError;
pub use loader::CliOverrides;
pub use types::{ClientCertMode, ListenerConfig, LogMode};
pub use validator::validate_config;
