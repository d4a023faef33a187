use netsdr_frame::FrameError;
use netsdr_transport::TransportError;

/// Errors that can occur in control channel operations.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// No control connection is established.
    #[error("not connected")]
    NotConnected,

    /// The encoded frame would exceed the protocol maximum.
    #[error("frame too large ({size} bytes, max {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// The receiver rejected the control item.
    #[error("control item 0x{control_code:04X} rejected (NAK)")]
    Nak { control_code: u16 },

    /// The response was for a different control item.
    #[error("unexpected response for control item 0x{actual:04X} (expected 0x{expected:04X})")]
    UnexpectedResponse { expected: u16, actual: u16 },

    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The client was shut down while the operation was in progress.
    #[error("operation cancelled")]
    Cancelled,

    /// No response arrived in time.
    #[error("no response after {0:?}")]
    Timeout(std::time::Duration),

    /// The reader task ended while a response was pending.
    #[error("connection lost")]
    ConnectionLost,

    /// IQ data receiver error.
    #[error("iq receiver error: {0}")]
    Receiver(#[from] netsdr_iq::IqError),
}

impl From<FrameError> for ProtocolError {
    fn from(err: FrameError) -> Self {
        match err {
            FrameError::FrameTooLarge { size, max } => ProtocolError::FrameTooLarge { size, max },
            FrameError::Io(io) => ProtocolError::Transport(TransportError::Io(io)),
            FrameError::ConnectionClosed => ProtocolError::ConnectionLost,
        }
    }
}

pub type Result<T> = std::result::Result<T, ProtocolError>;
