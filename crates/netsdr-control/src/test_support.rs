//! In-memory device double shared by the unit tests.

use bytes::BufMut;
use netsdr_frame::{decode_header, MessageType, HEADER_SIZE};
use tokio::io::{AsyncReadExt, DuplexStream};

/// A frame as the receiver sends it: the length field counts the whole frame.
pub(crate) fn target_frame(message_type: MessageType, control_code: u16, body: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_SIZE + body.len());
    let length = (HEADER_SIZE + body.len()) as u16;
    buf.put_u16_le(length | (u16::from(message_type.bits()) << 13));
    buf.put_u16_le(control_code);
    buf.put_slice(body);
    buf
}

pub(crate) fn ack(control_code: u16) -> Vec<u8> {
    target_frame(MessageType::RESPONSE, control_code, &[])
}

pub(crate) fn nak(control_code: u16) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_SIZE);
    buf.put_u16_le(2);
    buf.put_u16_le(control_code);
    buf
}

/// Read one host request and return its raw bytes.
pub(crate) async fn read_request(device: &mut DuplexStream) -> Vec<u8> {
    let mut header = [0u8; HEADER_SIZE];
    device
        .read_exact(&mut header)
        .await
        .expect("device should read request header");
    // Host frames carry `total - 2` in the length field.
    let total = usize::from(decode_header(&header).length) + 2;
    let mut raw = header.to_vec();
    raw.resize(total, 0);
    device
        .read_exact(&mut raw[HEADER_SIZE..])
        .await
        .expect("device should read request parameters");
    raw
}
