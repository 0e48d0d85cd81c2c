//! Configuration validator
//!
//! Everything checked here fails before the keystore is opened or a socket is bound.

use log::warn;
use std::path::Path;

use super::error::{ConfigError, Result};
use super::types::ListenerConfig;

/// Validate the configuration
pub fn validate_config(config: &ListenerConfig) -> Result<()> {
    validate_keystore(config)?;
    validate_network_settings(config)?;
    validate_general_settings(config)?;
    Ok(())
}

/// The credential store must name an existing regular file
fn validate_keystore(config: &ListenerConfig) -> Result<()> {
    if config.keystore.as_os_str().is_empty() {
        return Err(ConfigError::MissingRequiredValue("keystore".to_string()));
    }
    validate_file_exists(&config.keystore)
}

fn validate_network_settings(config: &ListenerConfig) -> Result<()> {
    if config.port == 0 {
        return Err(ConfigError::InvalidValue(
            "port".to_string(),
            "Port must be between 1 and 65535".to_string(),
        ));
    }
    Ok(())
}

fn validate_general_settings(config: &ListenerConfig) -> Result<()> {
    match config.log_level.as_str() {
        "error" | "warn" | "info" | "debug" | "trace" => {}
        level => {
            warn!("Invalid log level: {}. Using default: info", level);
        }
    }

    if config.buffer_size == 0 {
        return Err(ConfigError::InvalidValue(
            "buffer_size".to_string(),
            "Buffer size must be greater than 0".to_string(),
        ));
    }

    if !config.log_dir.is_dir() {
        return Err(ConfigError::InvalidValue(
            "log_dir".to_string(),
            format!("{} is not a directory", config.log_dir.display()),
        ));
    }

    Ok(())
}

fn validate_file_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.to_path_buf()));
    }
    if !path.is_file() {
        return Err(ConfigError::NotAFile(path.to_path_buf()));
    }
    Ok(())
}
