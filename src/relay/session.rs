//! Session model
//!
//! A session is the lifetime of the one accepted client connection. It is a
//! plain value owned by whoever drives it; there is no global session state.

use std::path::Path;

use super::logger::SessionLogger;
use crate::common::Result;
use crate::config::ListenerConfig;
use crate::tls::AcceptedChannel;

/// One accepted connection with its transcript
pub struct Session<S> {
    endpoint: String,
    stream: S,
    logger: SessionLogger,
}

impl<S> Session<S> {
    pub fn new(endpoint: impl Into<String>, stream: S, logger: SessionLogger) -> Self {
        Self {
            endpoint: endpoint.into(),
            stream,
            logger,
        }
    }

    /// Start a session for a freshly accepted channel
    ///
    /// Opens the transcript in the configured directory and mode.
    pub async fn open(channel: AcceptedChannel<S>, config: &ListenerConfig) -> Result<Self> {
        let logger =
            SessionLogger::create(&config.log_dir, &channel.endpoint, config.log_mode).await?;
        Ok(Self::new(channel.endpoint, channel.stream, logger))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn log_path(&self) -> &Path {
        self.logger.path()
    }

    pub(crate) fn into_parts(self) -> (String, S, SessionLogger) {
        (self.endpoint, self.stream, self.logger)
    }
}
