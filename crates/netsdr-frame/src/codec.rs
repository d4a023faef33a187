use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::trace;

use crate::error::{FrameError, Result};
use crate::message_type::MessageType;

/// Frame header: header word (2) + control code (2) = 4 bytes.
pub const HEADER_SIZE: usize = 4;

/// Largest frame the protocol allows, header included.
pub const MAX_FRAME_LEN: usize = 8194;

/// Largest parameter body that still fits in one frame.
pub const MAX_PARAMETERS_LEN: usize = MAX_FRAME_LEN - HEADER_SIZE;

/// Length field value the target uses for a NAK.
pub const NAK_LENGTH: u16 = 2;

const LENGTH_MASK: u16 = 0x1FFF;
const TYPE_SHIFT: u16 = 13;
const LENGTH_FIELD_SIZE: usize = 2;

/// A maximum-size frame has a length field of 8192, which wraps to 0 in 13 bits.
const MAX_LENGTH_FIELD: u16 = (MAX_FRAME_LEN - LENGTH_FIELD_SIZE) as u16;

/// Decoded header fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Raw 13-bit length field.
    pub length: u16,
    pub message_type: MessageType,
    pub control_code: u16,
}

impl FrameHeader {
    /// Number of body bytes that follow this header on an inbound stream.
    ///
    /// The target's frames are read as `length - 4` body bytes. This is the
    /// only place that rule lives; every reader goes through it.
    pub fn body_len(&self) -> usize {
        usize::from(self.length).saturating_sub(HEADER_SIZE)
    }

    /// True when the target rejected the control item.
    pub fn is_nak(&self) -> bool {
        self.length == NAK_LENGTH && self.message_type == MessageType::RESPONSE
    }
}

/// An outbound control item request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlItem {
    pub control_code: u16,
    pub parameters: Bytes,
}

impl ControlItem {
    /// Create a new control item.
    pub fn new(control_code: u16, parameters: impl Into<Bytes>) -> Self {
        Self {
            control_code,
            parameters: parameters.into(),
        }
    }
}

/// A decoded inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub header: FrameHeader,
    pub body: Bytes,
}

impl Frame {
    pub fn control_code(&self) -> u16 {
        self.header.control_code
    }

    pub fn message_type(&self) -> MessageType {
        self.header.message_type
    }

    /// The total wire size of this frame (header + body).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.body.len()
    }
}

/// Encode a control message into the wire format.
///
/// Wire format:
/// ```text
/// ┌─────────────────────────┬──────────────┬──────────────────┐
/// │ Header word (2B LE)     │ Control code │ Parameters       │
/// │ len13 | type3 << 13     │ (2B LE)      │                  │
/// └─────────────────────────┴──────────────┴──────────────────┘
/// ```
///
/// `len13` is the total frame length minus the two header-word bytes.
pub fn encode_frame(
    message_type: MessageType,
    control_code: u16,
    parameters: &[u8],
    dst: &mut BytesMut,
) -> Result<()> {
    let total = HEADER_SIZE + parameters.len();
    if total > MAX_FRAME_LEN {
        return Err(FrameError::FrameTooLarge {
            size: total,
            max: MAX_FRAME_LEN,
        });
    }

    let length = (total - LENGTH_FIELD_SIZE) as u16;
    let word = (length & LENGTH_MASK) | (u16::from(message_type.bits()) << TYPE_SHIFT);

    dst.reserve(total);
    dst.put_u16_le(word);
    dst.put_u16_le(control_code);
    dst.put_slice(parameters);
    Ok(())
}

/// Extract header fields from the first four bytes of a frame.
///
/// Purely structural: nothing is validated here.
pub fn decode_header(bytes: &[u8; HEADER_SIZE]) -> FrameHeader {
    let word = u16::from_le_bytes([bytes[0], bytes[1]]);
    let control_code = u16::from_le_bytes([bytes[2], bytes[3]]);

    let length = match word & LENGTH_MASK {
        0 => MAX_LENGTH_FIELD,
        length => length,
    };

    FrameHeader {
        length,
        message_type: MessageType::from_bits((word >> TYPE_SHIFT) as u8),
        control_code,
    }
}

/// Decode one inbound frame from a buffer.
///
/// Returns `None` if the buffer doesn't contain a complete frame yet.
/// On success, consumes exactly the header and `body_len()` bytes.
pub fn decode_frame(src: &mut BytesMut) -> Option<Frame> {
    if src.len() < HEADER_SIZE {
        return None;
    }

    let header = decode_header(&[src[0], src[1], src[2], src[3]]);
    let total = HEADER_SIZE + header.body_len();
    if src.len() < total {
        src.reserve(total - src.len());
        return None;
    }

    src.advance(HEADER_SIZE);
    let body = src.split_to(header.body_len()).freeze();
    trace!(
        message_type = header.message_type.target_name(),
        control_code = header.control_code,
        body_len = body.len(),
        "decoded frame"
    );

    Some(Frame { header, body })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Build a target-originated frame whose length field is `4 + body`.
    pub(crate) fn target_frame(message_type: MessageType, control_code: u16, body: &[u8]) -> BytesMut {
        let mut buf = BytesMut::new();
        let length = (HEADER_SIZE + body.len()) as u16;
        buf.put_u16_le(length | (u16::from(message_type.bits()) << TYPE_SHIFT));
        buf.put_u16_le(control_code);
        buf.put_slice(body);
        buf
    }

    fn roundtrip_header(message_type: MessageType, control_code: u16, len: usize) -> FrameHeader {
        let parameters = vec![0x5A; len];
        let mut buf = BytesMut::new();
        encode_frame(message_type, control_code, &parameters, &mut buf).unwrap();
        assert_eq!(buf.len(), HEADER_SIZE + len);
        assert_eq!(&buf[HEADER_SIZE..], parameters.as_slice());
        decode_header(&[buf[0], buf[1], buf[2], buf[3]])
    }

    #[test]
    fn test_encode_decode_header_roundtrip() {
        for len in [0usize, 1, 4, 6, 255, 4096, MAX_PARAMETERS_LEN - 1, MAX_PARAMETERS_LEN] {
            for bits in 0..8u8 {
                let message_type = MessageType::from_bits(bits);
                let header = roundtrip_header(message_type, 0x0018, len);
                assert_eq!(header.message_type, message_type);
                assert_eq!(header.control_code, 0x0018);
                assert_eq!(usize::from(header.length), HEADER_SIZE + len - 2);
            }
        }
    }

    #[test]
    fn test_encode_known_bytes() {
        let mut buf = BytesMut::new();
        encode_frame(
            MessageType::SET_CONTROL_ITEM,
            0x0018,
            &[0x00, 0x02, 0x00, 0x00],
            &mut buf,
        )
        .unwrap();
        assert_eq!(&buf[..], &[0x06, 0x00, 0x18, 0x00, 0x00, 0x02, 0x00, 0x00]);

        buf.clear();
        encode_frame(MessageType::REQUEST_CURRENT_CONTROL_ITEM, 0x0020, &[], &mut buf).unwrap();
        assert_eq!(&buf[..], &[0x02, 0x20, 0x20, 0x00]);
    }

    #[test]
    fn test_maximum_frame_wraps_length_field() {
        let parameters = vec![0u8; MAX_PARAMETERS_LEN];
        let mut buf = BytesMut::new();
        encode_frame(MessageType::DATA_ITEM_0, 0, &parameters, &mut buf).unwrap();
        assert_eq!(buf.len(), MAX_FRAME_LEN);
        // 8192 does not fit in 13 bits: only the type bits remain.
        assert_eq!(u16::from_le_bytes([buf[0], buf[1]]), 0b100 << 13);
    }

    #[test]
    fn test_encode_frame_too_large() {
        let parameters = vec![0u8; MAX_PARAMETERS_LEN + 1];
        let mut buf = BytesMut::new();
        let result = encode_frame(MessageType::SET_CONTROL_ITEM, 0x0018, &parameters, &mut buf);
        assert!(matches!(
            result,
            Err(FrameError::FrameTooLarge { size: 8195, max: 8194 })
        ));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_incomplete_header() {
        let mut buf = BytesMut::from(&[0x04, 0x00, 0x18][..]);
        assert!(decode_frame(&mut buf).is_none());
        assert_eq!(buf.len(), 3);
    }

    #[test]
    fn test_decode_incomplete_body() {
        let mut buf = target_frame(MessageType::RESPONSE, 0x0020, &[1, 2, 3, 4, 5, 6]);
        buf.truncate(HEADER_SIZE + 2);
        assert!(decode_frame(&mut buf).is_none());
        assert_eq!(buf.len(), HEADER_SIZE + 2);
    }

    #[test]
    fn test_nak_consumes_no_body() {
        let mut buf = BytesMut::new();
        buf.put_u16_le(NAK_LENGTH);
        buf.put_u16_le(0x0018);
        buf.extend_from_slice(&target_frame(MessageType::RESPONSE, 0x0020, &[]));

        let nak = decode_frame(&mut buf).unwrap();
        assert!(nak.header.is_nak());
        assert!(nak.body.is_empty());
        assert_eq!(buf.len(), HEADER_SIZE);

        let next = decode_frame(&mut buf).unwrap();
        assert_eq!(next.control_code(), 0x0020);
        assert!(!next.header.is_nak());
        assert!(buf.is_empty());
    }

    #[test]
    fn test_ack_without_body() {
        let mut buf = target_frame(MessageType::RESPONSE, 0x0018, &[]);
        let frame = decode_frame(&mut buf).unwrap();
        assert_eq!(frame.header.length, 4);
        assert_eq!(frame.header.body_len(), 0);
        assert!(frame.body.is_empty());
        assert!(buf.is_empty());
    }

    #[test]
    fn test_ack_with_body_consumes_exactly_body() {
        let mut buf = target_frame(MessageType::RESPONSE, 0x0020, &[0, 6, 5, 4, 3, 2]);
        buf.put_slice(&[0xEE, 0xFF]);

        let frame = decode_frame(&mut buf).unwrap();
        assert_eq!(frame.header.length, 10);
        assert_eq!(frame.body.as_ref(), &[0, 6, 5, 4, 3, 2]);
        assert_eq!(&buf[..], &[0xEE, 0xFF]);
    }

    #[test]
    fn test_unsolicited_classification() {
        let mut buf = target_frame(MessageType::UNSOLICITED_CONTROL_ITEM, 0x0005, b"ovl");
        let frame = decode_frame(&mut buf).unwrap();
        assert_eq!(frame.message_type(), MessageType::UNSOLICITED_CONTROL_ITEM);
        assert!(!frame.header.is_nak());
        assert_eq!(frame.body.as_ref(), b"ovl");
        assert_eq!(frame.wire_size(), HEADER_SIZE + 3);
    }

    #[test]
    fn test_multiple_frames() {
        let mut buf = target_frame(MessageType::RESPONSE, 0x0018, &[]);
        buf.extend_from_slice(&target_frame(
            MessageType::UNSOLICITED_CONTROL_ITEM,
            0x0001,
            &[9, 9],
        ));

        let f1 = decode_frame(&mut buf).unwrap();
        let f2 = decode_frame(&mut buf).unwrap();
        assert_eq!(f1.control_code(), 0x0018);
        assert_eq!(f2.control_code(), 0x0001);
        assert_eq!(f2.body.as_ref(), &[9, 9]);
        assert!(buf.is_empty());
    }
}
