use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use futures_util::SinkExt;
use netsdr_frame::{ControlItem, ControlItemCodec, Frame};
use netsdr_iq::{IqDataReceiver, IqReceiverConfig, IqReceiverHandle, ReceiveSummary};
use netsdr_transport::ControlStream;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::codec::FramedWrite;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::{ProtocolError, Result};
use crate::events::{ListenerStatus, UnsolicitedItem};
use crate::items::{self, CaptureMode, DataFormat, ReceiverChannel};
use crate::listener::{self, FrameReader, Routes};

type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Control channel client for a NetSDR receiver.
///
/// Requests take `&mut self`, so at most one control item is outstanding at
/// a time. Responses and unsolicited items are read by a background task
/// bound to the connection.
pub struct NetSdrClient {
    config: ClientConfig,
    events: broadcast::Sender<UnsolicitedItem>,
    shutdown: CancellationToken,
    connection: Option<Connection>,
    iq_receiver: Option<IqReceiverHandle>,
}

struct Connection {
    writer: FramedWrite<BoxedWriter, ControlItemCodec>,
    responses: mpsc::Receiver<Frame>,
    status: watch::Receiver<ListenerStatus>,
    cancel: CancellationToken,
    listener: JoinHandle<()>,
}

impl NetSdrClient {
    pub fn new(config: ClientConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            config,
            events,
            shutdown: CancellationToken::new(),
            connection: None,
            iq_receiver: None,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Connect to the receiver's control port.
    ///
    /// Any previous connection is torn down first.
    pub async fn connect(&mut self, host: &str, port: u16) -> Result<()> {
        self.disconnect().await;
        let stream = netsdr_transport::connect(host, port, self.config.connect_timeout).await?;
        info!(host, port, "connected to receiver");
        self.attach(stream).await;
        Ok(())
    }

    /// Take over an already established control stream.
    ///
    /// Any previous connection is torn down first.
    pub async fn attach<S: ControlStream>(&mut self, stream: S) {
        self.disconnect().await;

        let (read_half, write_half) = tokio::io::split(stream);
        let (response_tx, responses) = mpsc::channel(self.config.response_capacity.max(1));
        let (status_tx, status) = watch::channel(ListenerStatus::running());
        let cancel = self.shutdown.child_token();

        let routes = Routes {
            responses: response_tx,
            events: self.events.clone(),
            status: status_tx,
        };
        let listener = tokio::spawn(listener::run(
            FrameReader::new(read_half),
            routes,
            cancel.clone(),
        ));

        let writer: BoxedWriter = Box::new(write_half);
        self.connection = Some(Connection {
            writer: FramedWrite::new(writer, ControlItemCodec::new()),
            responses,
            status,
            cancel,
            listener,
        });
    }

    /// Tear down the connection and any IQ receiver started through it.
    ///
    /// Returns once the reader task has exited; no unsolicited item is
    /// dispatched afterwards.
    pub async fn disconnect(&mut self) {
        match self.stop_iq_receiver().await {
            Ok(_) => {}
            Err(err) => warn!(error = %err, "iq receiver ended with error"),
        }

        let Some(mut connection) = self.connection.take() else {
            return;
        };
        connection.cancel.cancel();

        if let Err(err) = connection.writer.get_mut().shutdown().await {
            debug!(error = %err, "control stream shutdown failed");
        }
        if let Err(err) = connection.listener.await {
            warn!(error = %err, "control listener task failed");
        }
        info!("disconnected from receiver");
    }

    /// True while the stream is attached and its reader task is running.
    ///
    /// Turns false once the device hangs up, the stream fails, or the client
    /// is cancelled, even before [`Self::disconnect`] is called.
    pub fn is_connected(&self) -> bool {
        self.connection.as_ref().is_some_and(Connection::is_live)
    }

    /// Receive unsolicited control items pushed by the receiver.
    ///
    /// Only items arriving after this call are delivered.
    pub fn subscribe(&self) -> broadcast::Receiver<UnsolicitedItem> {
        self.events.subscribe()
    }

    /// Latest health report of the reader task, if connected.
    pub fn listener_status(&self) -> Option<ListenerStatus> {
        self.connection
            .as_ref()
            .map(|connection| connection.status.borrow().clone())
    }

    /// Follow reader task health, if connected.
    ///
    /// The sender side closes when the reader task exits.
    pub fn listener_updates(&self) -> Option<watch::Receiver<ListenerStatus>> {
        self.connection
            .as_ref()
            .map(|connection| connection.status.clone())
    }

    /// Client-wide shutdown signal.
    ///
    /// Cancelling it aborts a request that is waiting for its response and
    /// stops the reader task and IQ receiver.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Start streaming IQ data to the host's data port.
    pub async fn start_iq_stream(
        &mut self,
        format: DataFormat,
        mode: CaptureMode,
        fifo_blocks: u8,
    ) -> Result<()> {
        self.send_control_item(&items::start_iq(format, mode, fifo_blocks))
            .await
    }

    pub async fn stop_iq_stream(&mut self) -> Result<()> {
        self.send_control_item(&items::stop_iq()).await
    }

    /// Tune `channel`. Only the low 40 bits of `frequency_hz` are sent.
    pub async fn set_frequency(&mut self, channel: ReceiverChannel, frequency_hz: u64) -> Result<()> {
        self.send_control_item(&items::receiver_frequency(channel, frequency_hz))
            .await
    }

    /// Send a set-control-item request and wait for its ACK or NAK.
    ///
    /// Fails with [`ProtocolError::NotConnected`] without writing anything
    /// when [`Self::is_connected`] is false. [`ProtocolError::Cancelled`] and
    /// [`ProtocolError::ConnectionLost`] are reserved for a request whose
    /// wait was cut short.
    pub async fn send_control_item(&mut self, item: &ControlItem) -> Result<()> {
        let wait = self.config.response_timeout;
        let connection = self
            .connection
            .as_mut()
            .filter(|connection| connection.is_live())
            .ok_or(ProtocolError::NotConnected)?;

        connection.drain_stale_responses();
        debug!(
            control_code = format_args!("0x{:04X}", item.control_code),
            len = item.parameters.len(),
            "sending control item"
        );
        connection.writer.send(item).await?;
        connection.handle_response(item.control_code, wait).await
    }

    /// Bind the IQ data port and append every datagram to `output`.
    ///
    /// The receiver stops on [`Self::stop_iq_receiver`], on disconnect, or
    /// when the client is cancelled. A receiver already running is stopped
    /// first. Returns the bound address.
    pub async fn start_iq_receiver(
        &mut self,
        config: &IqReceiverConfig,
        output: impl AsRef<Path>,
    ) -> Result<SocketAddr> {
        let cancel = match &self.connection {
            Some(connection) if connection.is_live() => connection.cancel.child_token(),
            _ => return Err(ProtocolError::NotConnected),
        };
        if let Some(summary) = self.stop_iq_receiver().await? {
            debug!(datagrams = summary.datagrams, "replaced running iq receiver");
        }

        let receiver = IqDataReceiver::create(config, output)
            .await?
            .with_cancellation(cancel);
        let local_addr = receiver.local_addr().map_err(netsdr_iq::IqError::Io)?;
        self.iq_receiver = Some(receiver.spawn());
        info!(%local_addr, "iq receiver started");
        Ok(local_addr)
    }

    /// Stop the IQ receiver, if one is running, and return its totals.
    pub async fn stop_iq_receiver(&mut self) -> Result<Option<ReceiveSummary>> {
        match self.iq_receiver.take() {
            Some(handle) => Ok(Some(handle.stop().await?)),
            None => Ok(None),
        }
    }

    /// True while an IQ receiver is started and its loop has not exited.
    ///
    /// A receiver that hit a socket or sink error reports false here; its
    /// error comes back from [`Self::stop_iq_receiver`].
    pub fn iq_receiver_running(&self) -> bool {
        self.iq_receiver
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Live counters of the running IQ receiver.
    pub fn iq_receiver_stats(&self) -> Option<ReceiveSummary> {
        self.iq_receiver.as_ref().map(IqReceiverHandle::stats)
    }
}

impl Default for NetSdrClient {
    fn default() -> Self {
        Self::new(ClientConfig::default())
    }
}

impl Drop for NetSdrClient {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

impl Connection {
    fn is_live(&self) -> bool {
        !self.cancel.is_cancelled() && self.status.borrow().is_running()
    }

    /// Discard responses that arrived after an earlier request gave up on them.
    fn drain_stale_responses(&mut self) {
        while let Ok(stale) = self.responses.try_recv() {
            debug!(
                control_code = format_args!("0x{:04X}", stale.control_code()),
                "discarding stale response"
            );
        }
    }

    async fn handle_response(&mut self, expected: u16, wait: Duration) -> Result<()> {
        let frame = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(ProtocolError::Cancelled),
            received = tokio::time::timeout(wait, self.responses.recv()) => match received {
                Ok(Some(frame)) => frame,
                Ok(None) => return Err(ProtocolError::ConnectionLost),
                Err(_) => return Err(ProtocolError::Timeout(wait)),
            },
        };
        classify_response(&frame, expected)
    }
}

fn classify_response(frame: &Frame, expected: u16) -> Result<()> {
    if frame.header.is_nak() {
        return Err(ProtocolError::Nak {
            control_code: expected,
        });
    }
    if frame.control_code() != expected {
        return Err(ProtocolError::UnexpectedResponse {
            expected,
            actual: frame.control_code(),
        });
    }
    debug!(
        control_code = format_args!("0x{expected:04X}"),
        extra = frame.body.len(),
        "control item acknowledged"
    );
    Ok(())
}
