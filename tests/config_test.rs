//! Test for configuration priority order
//!
//! Command line arguments > Environment variables > Configuration file > Default values

use serial_test::serial;
use std::env;
use std::fs;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use tempfile::tempdir;

use secure_listener::config::{
    validate_config, CliOverrides, ClientCertMode, ListenerConfig, LogMode, CONFIG_FILE_ENV,
};

const VARS: [&str; 6] = [
    "SECURE_LISTENER_PORT",
    "SECURE_LISTENER_LOG_MODE",
    "SECURE_LISTENER_LOG_LEVEL",
    "SECURE_LISTENER_BUFFER_SIZE",
    "SECURE_LISTENER_BIND_ADDRESS",
    CONFIG_FILE_ENV,
];

fn clear_env() {
    for var in VARS {
        env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_defaults_without_sources() {
    clear_env();

    let config = ListenerConfig::load(None).unwrap();

    assert_eq!(config.port, 0);
    assert_eq!(config.bind_address, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
    assert_eq!(config.log_dir, PathBuf::from("."));
    assert_eq!(config.log_mode, LogMode::Overwrite);
    assert_eq!(config.buffer_size, 8192);
    assert_eq!(config.client_cert_mode, ClientCertMode::None);
}

#[test]
#[serial]
fn test_config_priority() {
    clear_env();
    let dir = tempdir().unwrap();
    let config_file = dir.path().join("listener.json");
    fs::write(
        &config_file,
        r#"{
            "keystore": "from-file.p12",
            "port": 4443,
            "log_level": "info",
            "log_mode": "append",
            "buffer_size": 1024
        }"#,
    )
    .unwrap();

    env::set_var("SECURE_LISTENER_PORT", "5443");
    env::set_var("SECURE_LISTENER_LOG_LEVEL", "debug");
    env::set_var("SECURE_LISTENER_BIND_ADDRESS", "127.0.0.1");

    let loaded = ListenerConfig::load(Some(&config_file));
    clear_env();
    let config = loaded.unwrap().merge(CliOverrides {
        port: Some(6443),
        ..CliOverrides::default()
    });

    // command line
    assert_eq!(config.port, 6443);
    // environment
    assert_eq!(config.log_level, "debug");
    assert_eq!(config.bind_address, IpAddr::V4(Ipv4Addr::LOCALHOST));
    // file
    assert_eq!(config.keystore, PathBuf::from("from-file.p12"));
    assert_eq!(config.log_mode, LogMode::Append);
    assert_eq!(config.buffer_size, 1024);
    // default
    assert_eq!(config.client_cert_mode, ClientCertMode::None);
}

#[test]
#[serial]
fn test_config_file_from_environment() {
    clear_env();
    let dir = tempdir().unwrap();
    let config_file = dir.path().join("listener.json");
    fs::write(&config_file, r#"{ "port": 7443 }"#).unwrap();

    env::set_var(CONFIG_FILE_ENV, &config_file);
    let loaded = ListenerConfig::load(None);
    clear_env();

    assert_eq!(loaded.unwrap().port, 7443);
}

#[test]
#[serial]
fn test_missing_config_file_fails() {
    clear_env();
    let dir = tempdir().unwrap();

    let result = ListenerConfig::load(Some(&dir.path().join("absent.json")));

    assert!(result.is_err());
}

#[test]
#[serial]
fn test_loaded_config_validates() {
    clear_env();
    let dir = tempdir().unwrap();
    let keystore = dir.path().join("server.p12");
    fs::write(&keystore, b"not really pkcs12").unwrap();

    let config = ListenerConfig::load(None).unwrap().merge(CliOverrides {
        keystore: Some(keystore),
        port: Some(4443),
        log_dir: Some(dir.path().to_path_buf()),
        ..CliOverrides::default()
    });
    assert!(validate_config(&config).is_ok());

    let no_port = ListenerConfig { port: 0, ..config };
    assert!(validate_config(&no_port).is_err());
}
