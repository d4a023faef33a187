use std::net::SocketAddr;

use tokio::net::UdpSocket;
use tracing::info;

use crate::error::{Result, TransportError};

/// UDP port the receiver sends IQ data to.
pub const DEFAULT_IQ_PORT: u16 = 60000;

/// Bind the host-side datagram socket that IQ data is delivered to.
pub async fn bind_datagram(addr: SocketAddr) -> Result<UdpSocket> {
    let socket = UdpSocket::bind(addr)
        .await
        .map_err(|source| TransportError::Bind {
            addr: addr.to_string(),
            source,
        })?;

    let local = socket.local_addr().unwrap_or(addr);
    info!(%local, "listening for datagrams");
    Ok(socket)
}
