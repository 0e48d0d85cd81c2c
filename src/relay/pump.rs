//! Data pump module
//!
//! A pump copies bytes one way, from a source stream to a sink stream, until
//! the source ends or either side fails. Its liveness flag is the only state
//! visible from outside while it runs.

use bytes::Bytes;
use log::{debug, trace, warn};
use std::fmt;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use crate::common::ListenerError;
use crate::config::defaults;

/// Which way a pump moves data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Client stream to local output
    Inbound,
    /// Local input to client stream
    Outbound,
}

impl Direction {
    /// Short label used in log records
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Inbound => "client->local",
            Direction::Outbound => "local->client",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a pump left its copy loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpExit {
    /// Source returned a zero-length read
    EndOfStream,
    /// A read or write failed (already logged)
    Failed,
    /// The pump's cancellation token fired
    Cancelled,
}

/// Outcome of one pump run, for diagnostics only
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PumpReport {
    pub direction: Direction,
    pub bytes: u64,
    pub exit: PumpExit,
}

/// Observer side of a pump's liveness flag
#[derive(Debug, Clone)]
pub struct Liveness {
    rx: watch::Receiver<bool>,
}

impl Liveness {
    /// Whether the pump is inside its copy loop right now
    pub fn is_live(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait until the pump has entered its copy loop
    ///
    /// Also returns when the pump is already gone, so a pump that started and
    /// finished before anyone looked does not block the caller.
    pub async fn started(&mut self) {
        let _ = self.rx.wait_for(|live| *live).await;
    }

    /// Wait for the next flag transition
    ///
    /// Returns `false` once the pump has been dropped and no further
    /// transitions can happen.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}

/// Holds the flag up for the lifetime of the copy loop, on every exit path
struct LiveGuard<'a>(&'a watch::Sender<bool>);

impl<'a> LiveGuard<'a> {
    fn enter(flag: &'a watch::Sender<bool>) -> Self {
        flag.send_replace(true);
        Self(flag)
    }
}

impl Drop for LiveGuard<'_> {
    fn drop(&mut self) {
        self.0.send_replace(false);
    }
}

/// Unidirectional byte copier
pub struct DuplexPump {
    direction: Direction,
    buffer_size: usize,
    live: watch::Sender<bool>,
    tap: Option<mpsc::Sender<Bytes>>,
}

impl DuplexPump {
    /// Create a pump with the default 8 KiB buffer
    pub fn new(direction: Direction) -> Self {
        Self::with_buffer_size(direction, defaults::buffer_size())
    }

    /// Create a pump with a custom buffer size
    pub fn with_buffer_size(direction: Direction, buffer_size: usize) -> Self {
        let (live, _) = watch::channel(false);
        Self {
            direction,
            buffer_size: buffer_size.max(1),
            live,
            tap: None,
        }
    }

    /// Also hand a copy of every chunk read to `tap`
    ///
    /// The copy is sent before the chunk is written to the sink, waiting while
    /// the channel is full. The channel closes when the pump finishes.
    ///
    /// A tapped pump outlives its sink: once a write fails it stops writing
    /// but keeps reading the source, so the tap still sees every byte up to
    /// end-of-stream.
    pub fn with_tap(mut self, tap: mpsc::Sender<Bytes>) -> Self {
        self.tap = Some(tap);
        self
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Subscribe to the liveness flag
    pub fn liveness(&self) -> Liveness {
        Liveness { rx: self.live.subscribe() }
    }

    pub fn is_live(&self) -> bool {
        *self.live.borrow()
    }

    /// Copy `source` into `sink` until end-of-stream, failure or cancellation
    ///
    /// Each chunk is written in full and flushed before the next read. I/O
    /// errors are logged and end the loop; they are not returned. A sink error
    /// on a tapped pump only stops the writes (see [`DuplexPump::with_tap`]).
    pub async fn run<R, W>(self, mut source: R, mut sink: W, cancel: CancellationToken) -> PumpReport
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let direction = self.direction;
        let _guard = LiveGuard::enter(&self.live);
        let mut buffer = vec![0u8; self.buffer_size];
        let mut total_bytes = 0u64;
        let mut sink_open = true;

        let exit = loop {
            let n = tokio::select! {
                _ = cancel.cancelled() => break PumpExit::Cancelled,
                read = source.read(&mut buffer) => match read {
                    Ok(0) => break PumpExit::EndOfStream,
                    Ok(n) => n,
                    Err(source) => {
                        warn!("{}", ListenerError::StreamIo { direction: direction.as_str(), source });
                        break PumpExit::Failed;
                    }
                },
            };

            let chunk = &buffer[..n];

            if let Some(tap) = &self.tap {
                tokio::select! {
                    _ = cancel.cancelled() => break PumpExit::Cancelled,
                    // the receiver going away only means nobody is transcribing any more
                    _ = tap.send(Bytes::copy_from_slice(chunk)) => {}
                }
            }

            if !sink_open {
                trace!("{}: {} bytes tapped, sink closed", direction, n);
                continue;
            }

            let written = async {
                sink.write_all(chunk).await?;
                sink.flush().await
            };
            tokio::select! {
                _ = cancel.cancelled() => break PumpExit::Cancelled,
                result = written => {
                    if let Err(source) = result {
                        warn!("{}", ListenerError::StreamIo { direction: direction.as_str(), source });
                        if self.tap.is_none() {
                            break PumpExit::Failed;
                        }
                        sink_open = false;
                        continue;
                    }
                }
            }

            total_bytes += n as u64;
            trace!("{}: {} bytes", direction, n);
        };

        // a tapped pump that lost its sink still reports the failure
        let exit = match exit {
            PumpExit::EndOfStream if !sink_open => PumpExit::Failed,
            exit => exit,
        };

        debug!("{}: {:?} after {} bytes", direction, exit, total_bytes);

        PumpReport { direction, bytes: total_bytes, exit }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tokio::io::AsyncReadExt;

    /// Sink that rejects every write
    struct BrokenSink;

    impl AsyncWrite for BrokenSink {
        fn poll_write(self: Pin<&mut Self>, _: &mut Context<'_>, _: &[u8]) -> Poll<io::Result<usize>> {
            Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed")))
        }

        fn poll_flush(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_copy_is_lossless() {
        let input: Vec<u8> = (0..50_000u32).map(|i| (i % 251) as u8).collect();
        let (mut sink_reader, sink) = tokio::io::duplex(128 * 1024);

        let pump = DuplexPump::with_buffer_size(Direction::Inbound, 1000);
        let report = pump.run(&input[..], sink, CancellationToken::new()).await;

        assert_eq!(report.exit, PumpExit::EndOfStream);
        assert_eq!(report.bytes, input.len() as u64);

        let mut output = Vec::new();
        sink_reader.read_to_end(&mut output).await.unwrap();
        assert_eq!(output, input);
    }

    #[tokio::test]
    async fn test_liveness_transitions() {
        let (mut source_writer, source) = tokio::io::duplex(1024);
        let (_sink_reader, sink) = tokio::io::duplex(1024);

        let pump = DuplexPump::new(Direction::Outbound);
        let mut liveness = pump.liveness();
        assert!(!pump.is_live());
        assert!(!liveness.is_live());

        let task = tokio::spawn(pump.run(source, sink, CancellationToken::new()));
        liveness.started().await;
        assert!(liveness.is_live());

        source_writer.write_all(b"ping").await.unwrap();
        drop(source_writer);

        let report = task.await.unwrap();
        assert_eq!(report.bytes, 4);
        assert!(!liveness.is_live());
        // the last transition is still unseen; after it the closed channel reports no more
        while liveness.changed().await {}
        assert!(!liveness.is_live());
    }

    #[tokio::test]
    async fn test_immediate_eof() {
        let pump = DuplexPump::new(Direction::Inbound);
        let liveness = pump.liveness();
        let report = pump.run(&b""[..], tokio::io::sink(), CancellationToken::new()).await;

        assert_eq!(report.exit, PumpExit::EndOfStream);
        assert_eq!(report.bytes, 0);
        assert!(!liveness.is_live());
    }

    #[tokio::test]
    async fn test_write_failure_ends_pump() {
        let pump = DuplexPump::new(Direction::Outbound);
        let liveness = pump.liveness();
        let report = pump.run(&b"data"[..], BrokenSink, CancellationToken::new()).await;

        assert_eq!(report.exit, PumpExit::Failed);
        assert_eq!(report.bytes, 0);
        assert!(!liveness.is_live());
    }

    #[tokio::test]
    async fn test_cancellation() {
        // keep the writer alive so the read blocks forever
        let (_source_writer, source) = tokio::io::duplex(1024);
        let cancel = CancellationToken::new();

        let pump = DuplexPump::new(Direction::Outbound);
        let mut liveness = pump.liveness();
        let task = tokio::spawn(pump.run(source, tokio::io::sink(), cancel.clone()));

        liveness.started().await;
        cancel.cancel();

        let report = task.await.unwrap();
        assert_eq!(report.exit, PumpExit::Cancelled);
        assert!(!liveness.is_live());
    }

    #[tokio::test]
    async fn test_tap_sees_every_chunk() {
        let (tx, mut rx) = mpsc::channel(16);
        let pump = DuplexPump::with_buffer_size(Direction::Inbound, 4).with_tap(tx);
        pump.run(&b"hello world"[..], tokio::io::sink(), CancellationToken::new()).await;

        let mut tapped = Vec::new();
        while let Some(chunk) = rx.recv().await {
            tapped.extend_from_slice(&chunk);
        }
        assert_eq!(tapped, b"hello world");
    }

    #[tokio::test]
    async fn test_tap_outlives_failed_sink() {
        let (tx, mut rx) = mpsc::channel(16);
        let pump = DuplexPump::with_buffer_size(Direction::Inbound, 4).with_tap(tx);
        let report = pump.run(&b"hello world"[..], BrokenSink, CancellationToken::new()).await;

        assert_eq!(report.exit, PumpExit::Failed);
        assert_eq!(report.bytes, 0);

        let mut tapped = Vec::new();
        while let Some(chunk) = rx.recv().await {
            tapped.extend_from_slice(&chunk);
        }
        assert_eq!(tapped, b"hello world");
    }

    #[tokio::test]
    async fn test_full_tap_holds_back_reads() {
        let (tx, mut rx) = mpsc::channel(1);
        let (mut source_writer, source) = tokio::io::duplex(1024);
        let pump = DuplexPump::with_buffer_size(Direction::Inbound, 4).with_tap(tx);
        let task = tokio::spawn(pump.run(source, tokio::io::sink(), CancellationToken::new()));

        source_writer.write_all(b"aaaabbbbcccc").await.unwrap();
        drop(source_writer);

        // nothing is dropped even though the tap only holds one chunk
        let mut tapped = Vec::new();
        while let Some(chunk) = rx.recv().await {
            tapped.extend_from_slice(&chunk);
        }
        assert_eq!(tapped, b"aaaabbbbcccc");
        assert_eq!(task.await.unwrap().exit, PumpExit::EndOfStream);
    }
}
