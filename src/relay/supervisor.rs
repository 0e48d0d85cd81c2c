//! Session supervisor
//!
//! Runs the two pumps of a session and transcribes what the client sends.
//!
//! The client stream has a single reader, the inbound pump. Every chunk it
//! reads is relayed to local output and also handed to the supervisor over a
//! tap channel, so relay and transcript see the same bytes in the same order.
//! Losing local output does not stop the transcript: the tap only closes when
//! the client stream ends.
//! Pump liveness is observed through watch channels instead of polling.

use bytes::Bytes;
use log::{debug, error, info};
use std::fmt;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use super::lines::LineAccumulator;
use super::logger::SessionLogger;
use super::pump::{Direction, DuplexPump, Liveness};
use super::session::Session;
use crate::common::{ListenerError, Result};
use crate::config::defaults;

/// Lifecycle of a supervised session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Pumps not yet running
    Idle,
    /// Both pumps have entered their copy loops
    Active,
    /// A pump has stopped; remaining client output is being transcribed
    Draining,
    /// Session over, pumps stopped
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => write!(f, "idle"),
            SessionState::Active => write!(f, "active"),
            SessionState::Draining => write!(f, "draining"),
            SessionState::Closed => write!(f, "closed"),
        }
    }
}

/// Drives one session from pump start to teardown
pub struct SessionSupervisor<S, I, O> {
    session: Session<S>,
    local_in: I,
    local_out: O,
    buffer_size: usize,
    cancel: CancellationToken,
    state: watch::Sender<SessionState>,
}

impl<S, I, O> SessionSupervisor<S, I, O>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    I: AsyncRead + Unpin + Send + 'static,
    O: AsyncWrite + Unpin + Send + 'static,
{
    /// Create a supervisor
    ///
    /// # Parameters
    ///
    /// * `session` - The accepted session
    /// * `local_in` - Local input relayed to the client (stdin in production)
    /// * `local_out` - Local output receiving client bytes (stdout in production)
    /// * `cancel` - Tears the whole session down when cancelled
    pub fn new(session: Session<S>, local_in: I, local_out: O, cancel: CancellationToken) -> Self {
        let (state, _) = watch::channel(SessionState::Idle);
        Self {
            session,
            local_in,
            local_out,
            buffer_size: defaults::buffer_size(),
            cancel,
            state,
        }
    }

    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    /// Subscribe to state transitions
    pub fn state(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Run the session to its end
    ///
    /// # Returns
    ///
    /// `Ok(())` when the session was cancelled.
    ///
    /// # Errors
    ///
    /// * `ListenerError::PeerDisconnected` - the client closed its stream; every
    ///   line it sent has been transcribed
    /// * `ListenerError::Persistence` - the transcript could not be written
    pub async fn run(self) -> Result<()> {
        let Self { session, local_in, local_out, buffer_size, cancel, state } = self;
        let (endpoint, stream, mut logger) = session.into_parts();
        let (client_read, client_write) = tokio::io::split(stream);
        let (tap_tx, mut tap_rx) = mpsc::channel(defaults::TAP_CAPACITY);

        let inbound = DuplexPump::with_buffer_size(Direction::Inbound, buffer_size).with_tap(tap_tx);
        let outbound = DuplexPump::with_buffer_size(Direction::Outbound, buffer_size);
        let inbound_live = inbound.liveness();
        let outbound_live = outbound.liveness();

        let pumps = cancel.child_token();
        let inbound_task = tokio::spawn(inbound.run(client_read, local_out, pumps.clone()));
        let outbound_task = tokio::spawn(outbound.run(local_in, client_write, pumps.clone()));

        let result = tokio::select! {
            _ = cancel.cancelled() => {
                info!("Session with {} cancelled", endpoint);
                Ok(())
            }
            result = supervise(&endpoint, &state, &mut logger, &mut tap_rx, inbound_live, outbound_live) => result,
        };

        state.send_replace(SessionState::Closed);
        pumps.cancel();

        for task in [inbound_task, outbound_task] {
            match task.await {
                Ok(report) => debug!(
                    "Pump {} finished: {:?}, {} bytes",
                    report.direction, report.exit, report.bytes
                ),
                Err(e) => error!("Pump task failed: {}", e),
            }
        }

        info!(
            "Session with {} closed, {} line(s) written to {}",
            endpoint,
            logger.lines_written(),
            logger.path().display()
        );

        result
    }
}

/// Transcribe tapped lines and track pump liveness until the inbound side ends
async fn supervise(
    endpoint: &str,
    state: &watch::Sender<SessionState>,
    logger: &mut SessionLogger,
    tap: &mut mpsc::Receiver<Bytes>,
    mut inbound: Liveness,
    mut outbound: Liveness,
) -> Result<()> {
    let mut lines = LineAccumulator::new();

    // the inbound pump waits on a full tap meanwhile
    inbound.started().await;
    outbound.started().await;
    state.send_replace(SessionState::Active);
    debug!("Session with {} active", endpoint);

    let mut watch_inbound = true;
    let mut watch_outbound = true;

    loop {
        if *state.borrow() == SessionState::Active && (!inbound.is_live() || !outbound.is_live()) {
            state.send_replace(SessionState::Draining);
            debug!("Session with {} draining", endpoint);
        }

        tokio::select! {
            chunk = tap.recv() => match chunk {
                Some(chunk) => {
                    for line in lines.push(&chunk) {
                        record(endpoint, logger, &line).await?;
                    }
                }
                None => {
                    // inbound pump is gone and every chunk it read has been consumed
                    state.send_replace(SessionState::Draining);
                    if let Some(line) = lines.finish() {
                        record(endpoint, logger, &line).await?;
                    }
                    return Err(ListenerError::PeerDisconnected {
                        endpoint: endpoint.to_string(),
                        lines: logger.lines_written(),
                    });
                }
            },
            alive = inbound.changed(), if watch_inbound => watch_inbound = alive,
            alive = outbound.changed(), if watch_outbound => watch_outbound = alive,
        }
    }
}

async fn record(endpoint: &str, logger: &mut SessionLogger, line: &str) -> Result<()> {
    debug!("[{}] {}", endpoint, line);
    logger.append(line).await
}
