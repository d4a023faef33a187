//! The single reader task of a control connection.
//!
//! It is the only code that reads from the stream. Every frame is consumed
//! whole (header plus `body_len()` bytes) whatever its type, so the stream
//! never loses sync, and is then routed:
//!
//! - unsolicited control items are broadcast to subscribers,
//! - responses (ACK/NAK) go to the pending-response slot,
//! - everything else is logged and dropped.

use std::io::ErrorKind;

use bytes::BytesMut;
use netsdr_frame::{ControlItemCodec, Frame, FrameError, MessageType, MAX_FRAME_LEN};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::{broadcast, mpsc, watch};
use tokio_util::codec::Decoder;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::events::{ListenerState, ListenerStatus, UnsolicitedItem};

pub(crate) struct Routes {
    pub(crate) responses: mpsc::Sender<Frame>,
    pub(crate) events: broadcast::Sender<UnsolicitedItem>,
    pub(crate) status: watch::Sender<ListenerStatus>,
}

/// Frame reader that stays usable after a read error.
///
/// A failed read leaves buffered bytes in place; the next call resumes the
/// partial frame.
pub(crate) struct FrameReader<R> {
    io: R,
    codec: ControlItemCodec,
    buffer: BytesMut,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub(crate) fn new(io: R) -> Self {
        Self {
            io,
            codec: ControlItemCodec::new(),
            buffer: BytesMut::with_capacity(MAX_FRAME_LEN),
        }
    }

    /// Next complete frame, or `None` on a clean end of stream.
    ///
    /// Cancel safe: bytes already read stay buffered.
    pub(crate) async fn next_frame(&mut self) -> Result<Option<Frame>, FrameError> {
        loop {
            if let Some(frame) = self.codec.decode(&mut self.buffer)? {
                return Ok(Some(frame));
            }
            if self.io.read_buf(&mut self.buffer).await? == 0 {
                return self.codec.decode_eof(&mut self.buffer);
            }
        }
    }
}

pub(crate) async fn run<R>(mut frames: FrameReader<R>, routes: Routes, cancel: CancellationToken)
where
    R: AsyncRead + Unpin,
{
    debug!("control listener started");

    let final_state = loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => break ListenerState::Stopped,
            next = frames.next_frame() => next,
        };

        match next {
            Ok(Some(frame)) => routes.dispatch(frame),
            Ok(None) | Err(FrameError::ConnectionClosed) => break ListenerState::Closed,
            Err(FrameError::Io(err)) if is_connection_fatal(err.kind()) => {
                warn!(error = %err, "control stream failed");
                routes.record_error(err.to_string());
                break ListenerState::Failed;
            }
            Err(err) => {
                warn!(error = %err, "control stream read error");
                routes.record_error(err.to_string());
            }
        }
    };

    routes.status.send_modify(|status| status.state = final_state);
    info!(state = final_state.as_str(), "control listener stopped");
}

impl Routes {
    fn dispatch(&self, frame: Frame) {
        match frame.message_type() {
            MessageType::UNSOLICITED_CONTROL_ITEM => {
                let item = UnsolicitedItem {
                    control_code: frame.control_code(),
                    body: frame.body,
                };
                let delivered = self.events.send(item).unwrap_or(0);
                trace!(
                    control_code = format_args!("0x{:04X}", frame.header.control_code),
                    subscribers = delivered,
                    "unsolicited item"
                );
                self.status
                    .send_modify(|status| status.unsolicited_dispatched += 1);
            }
            MessageType::RESPONSE => {
                let control_code = frame.control_code();
                match self.responses.try_send(frame) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        warn!(
                            control_code = format_args!("0x{control_code:04X}"),
                            "response slot full, dropping response"
                        );
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => {
                        debug!(
                            control_code = format_args!("0x{control_code:04X}"),
                            "no client waiting, dropping response"
                        );
                    }
                }
            }
            other => {
                debug!(
                    message_type = other.target_name(),
                    control_code = format_args!("0x{:04X}", frame.header.control_code),
                    len = frame.body.len(),
                    "ignoring frame"
                );
                self.status.send_modify(|status| status.ignored_frames += 1);
            }
        }

        // Counted after routing so a reader of the status knows the frame has landed.
        self.status.send_modify(|status| status.frames_received += 1);
    }

    fn record_error(&self, error: String) {
        self.status.send_modify(|status| {
            status.read_errors += 1;
            status.last_error = Some(error);
        });
    }
}

fn is_connection_fatal(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::BrokenPipe
            | ErrorKind::NotConnected
            | ErrorKind::UnexpectedEof
    )
}
