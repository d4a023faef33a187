use std::time::Duration;

use tokio::net::TcpStream;
use tracing::{debug, warn};

use crate::error::{Result, TransportError};

/// TCP port the receiver listens on for control items.
pub const DEFAULT_CONTROL_PORT: u16 = 50000;

/// Upper bound for establishing the control connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Connect to the receiver's control port.
///
/// Nagle is disabled: control items are tiny and each one waits for an ACK.
pub async fn connect(host: &str, port: u16, timeout: Duration) -> Result<TcpStream> {
    let addr = format!("{host}:{port}");
    debug!(%addr, "connecting control stream");

    let stream = match tokio::time::timeout(timeout, TcpStream::connect(&addr)).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(source)) => return Err(TransportError::Connect { addr, source }),
        Err(_) => {
            return Err(TransportError::ConnectTimeout {
                addr,
                after: timeout,
            })
        }
    };

    if let Err(err) = stream.set_nodelay(true) {
        warn!(%addr, error = %err, "failed to disable nagle on control stream");
    }

    debug!(%addr, "control stream connected");
    Ok(stream)
}
