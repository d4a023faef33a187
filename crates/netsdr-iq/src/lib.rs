//! Bulk IQ payload receiver.
//!
//! The receiver pushes IQ samples as UDP datagrams. This crate binds the
//! host-side socket and appends every datagram payload, verbatim and in
//! arrival order, to an output sink. No framing, sequencing or gap
//! detection is applied.

pub mod error;
pub mod receiver;

pub use error::{IqError, Result};
pub use receiver::{
    IqDataReceiver, IqReceiverConfig, IqReceiverHandle, ReceiveSummary, ReceiverStats,
};
