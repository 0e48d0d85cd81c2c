//! Secure channel provider
//!
//! Produces the one authenticated, encrypted stream a session runs on.

use log::{debug, info};
use openssl::ssl::{Ssl, SslAcceptor};
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tokio_openssl::SslStream;

use crate::common::{endpoint_id, ListenerError, Result};

/// A client connection that completed its handshake
pub struct AcceptedChannel<S> {
    /// Encrypted bidirectional stream
    pub stream: S,
    /// Client endpoint identifier (peer IP)
    pub endpoint: String,
    /// Full peer address
    pub peer_addr: SocketAddr,
}

/// Source of exactly one secure client stream
///
/// `accept` consumes the provider, so a second connection can never be taken
/// from the same instance.
pub trait SecureChannelProvider {
    /// Stream handed to the session
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    /// Wait for one client and return its negotiated stream
    fn accept(self) -> impl Future<Output = Result<AcceptedChannel<Self::Stream>>> + Send;
}

/// OpenSSL-backed provider listening on a TCP port
pub struct TlsChannelProvider {
    listener: TcpListener,
    acceptor: SslAcceptor,
    local_addr: SocketAddr,
}

impl TlsChannelProvider {
    /// Bind the listening socket
    ///
    /// # Errors
    ///
    /// `ListenerError::Bind` when the address is unavailable.
    pub async fn bind(addr: SocketAddr, acceptor: SslAcceptor) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ListenerError::Bind { addr, source })?;
        let local_addr = listener.local_addr()?;

        info!("[>] Server listening on port: {}", local_addr.port());

        Ok(Self { listener, acceptor, local_addr })
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

impl SecureChannelProvider for TlsChannelProvider {
    type Stream = SslStream<TcpStream>;

    async fn accept(self) -> Result<AcceptedChannel<Self::Stream>> {
        let Self { listener, acceptor, .. } = self;

        let (tcp, peer_addr) = listener.accept().await?;
        // one client per process: stop listening right away
        drop(listener);
        debug!("Accepted TCP connection from {}", peer_addr);

        let ssl = Ssl::new(acceptor.context())?;
        let mut stream = SslStream::new(ssl, tcp)?;
        Pin::new(&mut stream)
            .accept()
            .await
            .map_err(|e| ListenerError::Handshake(e.to_string()))?;

        debug!(
            "TLS handshake successful ({}, {})",
            stream.ssl().version_str(),
            stream.ssl().current_cipher().map(|c| c.name()).unwrap_or("unknown cipher")
        );
        if let Some(cert) = stream.ssl().peer_certificate() {
            info!("Client certificate subject: {:?}", cert.subject_name());
        }

        let endpoint = endpoint_id(&peer_addr);
        info!("[>] New Connection: {}", endpoint);

        Ok(AcceptedChannel { stream, endpoint, peer_addr })
    }
}
