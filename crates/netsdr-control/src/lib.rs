//! Control channel for NetSDR receivers.
//!
//! [`NetSdrClient`] owns the TCP control stream. A single background reader
//! task decodes every inbound frame and routes it: responses go to the
//! request currently waiting for them, unsolicited control items are
//! broadcast to subscribers. Requests never read the stream themselves.

pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod items;
mod listener;

pub use client::NetSdrClient;
pub use config::ClientConfig;
pub use error::{ProtocolError, Result};
pub use events::{ListenerState, ListenerStatus, UnsolicitedItem};
pub use items::{
    CaptureMode, DataFormat, ReceiverChannel, StreamState, MAX_FREQUENCY_HZ, RECEIVER_FREQUENCY,
    RECEIVER_STATE,
};

#[cfg(test)]
mod test_support;
