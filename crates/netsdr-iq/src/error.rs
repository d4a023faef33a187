use std::path::PathBuf;

/// Errors that can occur while receiving IQ data.
#[derive(Debug, thiserror::Error)]
pub enum IqError {
    /// Failed to bind the datagram socket.
    #[error("transport error: {0}")]
    Transport(#[from] netsdr_transport::TransportError),

    /// Failed to open the output sink.
    #[error("failed to open output {path}: {source}")]
    OpenSink {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Receiving a datagram or writing it to the sink failed.
    #[error("iq receiver I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The receiver task panicked or was aborted.
    #[error("iq receiver task failed: {0}")]
    TaskFailed(String),
}

pub type Result<T> = std::result::Result<T, IqError>;
