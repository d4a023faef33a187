//! Control item framing for NetSDR receivers.
//!
//! Every control message is framed with:
//! - A 2-byte little-endian header word: 13-bit length, 3-bit message type
//! - A 2-byte little-endian control code
//! - A variable body (the control item parameters)
//!
//! The whole frame never exceeds 8194 bytes.

pub mod codec;
pub mod error;
pub mod message_type;

#[cfg(feature = "async")]
pub mod stream;

pub use codec::{
    decode_frame, decode_header, encode_frame, ControlItem, Frame, FrameHeader, HEADER_SIZE,
    MAX_FRAME_LEN, MAX_PARAMETERS_LEN, NAK_LENGTH,
};
pub use error::{FrameError, Result};
pub use message_type::MessageType;

#[cfg(feature = "async")]
pub use stream::ControlItemCodec;
