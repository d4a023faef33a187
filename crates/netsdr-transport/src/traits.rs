use tokio::io::{AsyncRead, AsyncWrite};

/// A connected, bidirectional control stream.
///
/// Implemented for every `AsyncRead + AsyncWrite` type that can be moved into
/// a background task: `TcpStream` in production, `DuplexStream` in tests.
pub trait ControlStream: AsyncRead + AsyncWrite + Send + 'static {}

impl<T> ControlStream for T where T: AsyncRead + AsyncWrite + Send + 'static {}
