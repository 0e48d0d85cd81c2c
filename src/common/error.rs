//! Error handling module
//!
//! This module defines the error types and result type aliases used in the application.

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

/// Secure listener error type
#[derive(Error, Debug)]
pub enum ListenerError {
    /// Bad credential input: missing, unreadable or corrupt store, wrong passphrase,
    /// or an invalid configuration value
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The listening port could not be bound
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        /// Address we tried to bind
        addr: SocketAddr,
        /// Underlying socket error
        #[source]
        source: io::Error,
    },

    /// TLS negotiation failed after a client connected
    #[error("TLS handshake error: {0}")]
    Handshake(String),

    /// Pump-level read/write failure
    ///
    /// Pumps only log this; it never crosses into the supervisor.
    #[error("Stream I/O error ({direction}): {source}")]
    StreamIo {
        /// Pump direction label
        direction: &'static str,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The session log could not be created or written
    #[error("Failed to write session log {path}: {source}")]
    Persistence {
        /// Log artifact path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The client closed the inbound stream
    #[error("Peer {endpoint} disconnected after {lines} logged line(s)")]
    PeerDisconnected {
        /// Client endpoint identifier
        endpoint: String,
        /// Number of lines written to the session log
        lines: u64,
    },

    /// The listener was shut down by a signal
    #[error("Session cancelled")]
    Cancelled,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// OpenSSL error
    #[error("OpenSSL error: {0}")]
    Ssl(#[from] openssl::error::ErrorStack),
}

impl ListenerError {
    /// Process exit status for this error
    ///
    /// A signal-driven shutdown is not a failure; everything else is.
    pub fn exit_code(&self) -> i32 {
        match self {
            ListenerError::Cancelled => 0,
            _ => 1,
        }
    }
}

/// Result type alias
///
/// This is a `Result` type alias that uses our custom `ListenerError`.
pub type Result<T> = std::result::Result<T, ListenerError>;
