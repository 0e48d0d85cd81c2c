//! Listener module
//!
//! Ties the pieces together for the lifetime of the process: bind, accept
//! the one client, open its session and supervise it.

use log::info;
use openssl::ssl::SslAcceptor;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::sync::CancellationToken;

use super::session::Session;
use super::supervisor::SessionSupervisor;
use crate::common::Result;
use crate::config::ListenerConfig;
use crate::tls::{SecureChannelProvider, TlsChannelProvider};

/// Single-connection TLS listener
///
/// Accepts exactly one client, relays it to the given local streams and
/// transcribes what it sends.
pub struct Listener {
    config: ListenerConfig,
    tls_acceptor: SslAcceptor,
}

impl Listener {
    /// Create a new listener
    ///
    /// # Parameters
    ///
    /// * `config` - Validated listener configuration
    /// * `tls_acceptor` - Acceptor built from the credential store
    pub fn new(config: ListenerConfig, tls_acceptor: SslAcceptor) -> Self {
        Self { config, tls_acceptor }
    }

    pub fn config(&self) -> &ListenerConfig {
        &self.config
    }

    /// Bind the port and serve the one session
    ///
    /// # Errors
    ///
    /// `ListenerError::Bind` if the port is unavailable, plus everything
    /// [`serve`] returns.
    pub async fn run<I, O>(self, local_in: I, local_out: O, cancel: CancellationToken) -> Result<()>
    where
        I: AsyncRead + Unpin + Send + 'static,
        O: AsyncWrite + Unpin + Send + 'static,
    {
        let provider = TlsChannelProvider::bind(self.config.listen_addr(), self.tls_acceptor).await?;
        serve(provider, &self.config, local_in, local_out, cancel).await
    }
}

/// Accept one client from `provider` and supervise its session
///
/// Returns `Ok(())` when cancelled, whether before or after a client arrived.
///
/// # Errors
///
/// `ListenerError::Handshake` from the provider, and the session's own
/// terminal errors (`PeerDisconnected`, `Persistence`).
pub async fn serve<P, I, O>(
    provider: P,
    config: &ListenerConfig,
    local_in: I,
    local_out: O,
    cancel: CancellationToken,
) -> Result<()>
where
    P: SecureChannelProvider,
    I: AsyncRead + Unpin + Send + 'static,
    O: AsyncWrite + Unpin + Send + 'static,
{
    let channel = tokio::select! {
        _ = cancel.cancelled() => {
            info!("Shut down before a client connected");
            return Ok(());
        }
        channel = provider.accept() => channel?,
    };

    let session = Session::open(channel, config).await?;
    info!("Session started with {}", session.endpoint());

    SessionSupervisor::new(session, local_in, local_out, cancel)
        .with_buffer_size(config.buffer_size)
        .run()
        .await
}
