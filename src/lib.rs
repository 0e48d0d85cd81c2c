//! Secure Listener: single-connection TLS relay with session transcript
//!
//! Listens on a TLS-protected port, accepts exactly one client and duplexes
//! bytes between that client and the local standard input/output. Every line
//! the client sends is also written to a per-client transcript file.
//!
//! # Main Features
//!
//! - Server identity from a password-protected PKCS#12 credential store
//! - All cipher suites of the OpenSSL build enabled
//! - Single reader on the client stream, fanned out to relay and transcript
//! - Deterministic teardown on Ctrl+C / SIGTERM
//!
//! # Example
//!
//! ```no_run
//! use secure_listener::{Listener, Result};
//! use secure_listener::config::{ClientCertMode, ListenerConfig};
//! use secure_listener::tls::{create_tls_acceptor, load_keystore, Passphrase};
//! use std::path::PathBuf;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = ListenerConfig {
//!         keystore: PathBuf::from("server.p12"),
//!         port: 4443,
//!         ..ListenerConfig::default()
//!     };
//!
//!     let identity = load_keystore(&config.keystore, Passphrase::from("changeit"))?;
//!     let acceptor = create_tls_acceptor(&identity, &ClientCertMode::None)?;
//!
//!     Listener::new(config, acceptor)
//!         .run(tokio::io::stdin(), tokio::io::stdout(), CancellationToken::new())
//!         .await
//! }
//! ```

// Public modules
pub mod common;
pub mod config;
pub mod relay;
pub mod tls;

// Re-export commonly used structures and functions for convenience
pub use common::{ListenerError, Result};
pub use relay::{DuplexPump, Listener, Session, SessionLogger, SessionState, SessionSupervisor};
pub use tls::{create_tls_acceptor, SecureChannelProvider, TlsChannelProvider};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
