//! `tokio_util::codec` adapter so frames can be read with `FramedRead`
//! and written with `FramedWrite`.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};
use tracing::debug;

use crate::codec::{decode_frame, encode_frame, ControlItem, Frame};
use crate::error::FrameError;
use crate::message_type::MessageType;

/// Decodes target frames and encodes set-control-item requests.
#[derive(Debug, Clone, Copy, Default)]
pub struct ControlItemCodec;

impl ControlItemCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for ControlItemCodec {
    type Item = Frame;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, FrameError> {
        Ok(decode_frame(src))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, FrameError> {
        match decode_frame(src) {
            Some(frame) => Ok(Some(frame)),
            None if src.is_empty() => Ok(None),
            None => {
                debug!(buffered = src.len(), "stream ended inside a frame");
                Err(FrameError::ConnectionClosed)
            }
        }
    }
}

impl<'a> Encoder<&'a ControlItem> for ControlItemCodec {
    type Error = FrameError;

    fn encode(&mut self, item: &'a ControlItem, dst: &mut BytesMut) -> Result<(), FrameError> {
        encode_frame(
            MessageType::SET_CONTROL_ITEM,
            item.control_code,
            &item.parameters,
            dst,
        )
    }
}
