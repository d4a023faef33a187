//! Network transports for NetSDR receivers.
//!
//! The receiver exposes two independent transports:
//! - A TCP stream carrying control items (default port 50000)
//! - A UDP socket on the host side receiving IQ data (default port 60000)
//!
//! This is the lowest layer of netsdr. Everything else builds on top of
//! the streams and sockets provided here.

pub mod error;
pub mod tcp;
pub mod traits;
pub mod udp;

pub use error::{Result, TransportError};
pub use tcp::{connect, DEFAULT_CONNECT_TIMEOUT, DEFAULT_CONTROL_PORT};
pub use traits::ControlStream;
pub use udp::{bind_datagram, DEFAULT_IQ_PORT};
