use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use netsdr_transport::{bind_datagram, DEFAULT_IQ_PORT};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::error::{IqError, Result};

/// Largest payload a single UDP datagram can carry.
const MAX_DATAGRAM_SIZE: usize = 64 * 1024;

/// Configuration for the IQ data receiver.
#[derive(Debug, Clone)]
pub struct IqReceiverConfig {
    /// Local address to bind. Default: `0.0.0.0:60000`.
    pub bind_addr: SocketAddr,
    /// Receive buffer size; longer datagrams are truncated by the OS.
    pub recv_buffer_size: usize,
}

impl Default for IqReceiverConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_IQ_PORT)),
            recv_buffer_size: MAX_DATAGRAM_SIZE,
        }
    }
}

/// Totals reported when the receiver stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReceiveSummary {
    pub datagrams: u64,
    pub bytes: u64,
}

/// Live counters shared between the receive loop and its observers.
#[derive(Debug, Clone, Default)]
pub struct ReceiverStats {
    inner: Arc<Counters>,
}

#[derive(Debug, Default)]
struct Counters {
    datagrams: AtomicU64,
    bytes: AtomicU64,
}

impl ReceiverStats {
    fn record(&self, len: usize) {
        self.inner.datagrams.fetch_add(1, Ordering::Relaxed);
        self.inner.bytes.fetch_add(len as u64, Ordering::Relaxed);
    }

    /// Point-in-time copy of the counters.
    pub fn snapshot(&self) -> ReceiveSummary {
        ReceiveSummary {
            datagrams: self.inner.datagrams.load(Ordering::Relaxed),
            bytes: self.inner.bytes.load(Ordering::Relaxed),
        }
    }
}

/// Receives IQ datagrams and appends their payloads to a sink.
pub struct IqDataReceiver<W> {
    socket: UdpSocket,
    sink: W,
    cancel: CancellationToken,
    stats: ReceiverStats,
    recv_buffer_size: usize,
}

impl IqDataReceiver<BufWriter<File>> {
    /// Bind the datagram socket and create (or truncate) the output file.
    pub async fn create(config: &IqReceiverConfig, output: impl AsRef<Path>) -> Result<Self> {
        let socket = bind_datagram(config.bind_addr).await?;

        let path = output.as_ref();
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .await
            .map_err(|source| IqError::OpenSink {
                path: path.to_path_buf(),
                source,
            })?;
        debug!(?path, "opened iq output");

        Ok(Self::new(socket, BufWriter::new(file), config))
    }
}

impl<W> IqDataReceiver<W>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    /// Wrap an already bound socket and an open sink.
    pub fn new(socket: UdpSocket, sink: W, config: &IqReceiverConfig) -> Self {
        Self {
            socket,
            sink,
            cancel: CancellationToken::new(),
            stats: ReceiverStats::default(),
            recv_buffer_size: config.recv_buffer_size.max(1),
        }
    }

    /// Stop when `token` is cancelled instead of using a private token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Live counters.
    pub fn stats(&self) -> ReceiverStats {
        self.stats.clone()
    }

    /// Address the socket is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Receive until cancelled or until the first receive/write error.
    ///
    /// The sink is flushed and dropped on every exit path.
    pub async fn run(self) -> Result<ReceiveSummary> {
        let Self {
            socket,
            mut sink,
            cancel,
            stats,
            recv_buffer_size,
        } = self;
        let mut buf = vec![0u8; recv_buffer_size];

        let outcome = loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("iq receiver cancelled");
                    break Ok(());
                }
                received = socket.recv(&mut buf) => match received {
                    Ok(n) => {
                        if let Err(err) = sink.write_all(&buf[..n]).await {
                            break Err(IqError::Io(err));
                        }
                        stats.record(n);
                        trace!(bytes = n, "iq datagram received");
                    }
                    Err(err) => break Err(IqError::Io(err)),
                }
            }
        };

        let flushed = sink.flush().await;
        let summary = stats.snapshot();

        match outcome {
            Ok(()) => {
                flushed?;
                info!(
                    datagrams = summary.datagrams,
                    bytes = summary.bytes,
                    "iq receiver stopped"
                );
                Ok(summary)
            }
            Err(err) => {
                warn!(error = %err, datagrams = summary.datagrams, "iq receiver failed");
                Err(err)
            }
        }
    }

    /// Run the receive loop on a background task.
    pub fn spawn(self) -> IqReceiverHandle {
        let cancel = self.cancel.clone();
        let stats = self.stats.clone();
        let local_addr = self.local_addr().ok();
        let join = tokio::spawn(self.run());

        IqReceiverHandle {
            cancel,
            stats,
            local_addr,
            join,
        }
    }
}

/// Handle to a receiver running on a background task.
///
/// Dropping the handle cancels the receiver.
pub struct IqReceiverHandle {
    cancel: CancellationToken,
    stats: ReceiverStats,
    local_addr: Option<SocketAddr>,
    join: JoinHandle<Result<ReceiveSummary>>,
}

impl IqReceiverHandle {
    /// Current counters.
    pub fn stats(&self) -> ReceiveSummary {
        self.stats.snapshot()
    }

    /// Address the receiver socket is bound to.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// True once the receive loop has exited (cancelled or failed).
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Cancel the receiver and wait for it to release its socket and sink.
    pub async fn stop(mut self) -> Result<ReceiveSummary> {
        self.cancel.cancel();
        match (&mut self.join).await {
            Ok(result) => result,
            Err(err) => Err(IqError::TaskFailed(err.to_string())),
        }
    }
}

impl Drop for IqReceiverHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
