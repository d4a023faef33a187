//! Control and IQ streaming client for NetSDR receivers.
//!
//! A NetSDR receiver is configured over a TCP control channel and pushes IQ
//! samples to the host over UDP.
//!
//! # Crate Structure
//!
//! - [`transport`]: TCP connect and UDP bind
//! - [`frame`]: Control item framing (4-byte header + parameters)
//! - [`control`]: Control channel client, ACK/NAK handling, unsolicited items
//! - [`iq`]: IQ datagram receiver writing to a sink

/// Re-export transport types.
pub mod transport {
    pub use netsdr_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use netsdr_frame::*;
}

/// Re-export control channel types.
pub mod control {
    pub use netsdr_control::*;
}

/// Re-export IQ receiver types.
pub mod iq {
    pub use netsdr_iq::*;
}

pub use netsdr_control::{ClientConfig, NetSdrClient, ProtocolError};
