//! Control items understood by the client and the configuration bytes they carry.

use netsdr_frame::ControlItem;
use tracing::warn;

/// Receiver state: data format, run/stop, capture mode, FIFO blocks.
pub const RECEIVER_STATE: u16 = 0x0018;

/// Receiver frequency: channel selector + 40-bit frequency in Hz.
pub const RECEIVER_FREQUENCY: u16 = 0x0020;

/// Number of frequency bytes on the wire.
pub const FREQUENCY_BYTES: usize = 5;

/// Highest frequency representable in 40 bits (~1.1 THz).
///
/// Anything above this loses its upper 24 bits when encoded.
pub const MAX_FREQUENCY_HZ: u64 = (1 << (FREQUENCY_BYTES * 8)) - 1;

/// Sample data format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DataFormat {
    Real = 0x00,
    Complex = 0x80,
}

/// Run/stop selector of the receiver state item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum StreamState {
    Stop = 0x01,
    Run = 0x02,
}

/// Device-side sample packaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CaptureMode {
    Contiguous16Bit = 0x00,
    Contiguous24Bit = 0x80,
    Fifo16Bit = 0x01,
    HardwareTriggered24Bit = 0x83,
    HardwareTriggered16Bit = 0x03,
}

/// Receiver channel selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ReceiverChannel {
    Channel1 = 0x00,
    Channel2 = 0x02,
    All = 0xFF,
}

impl From<DataFormat> for u8 {
    fn from(value: DataFormat) -> Self {
        value as u8
    }
}

impl From<StreamState> for u8 {
    fn from(value: StreamState) -> Self {
        value as u8
    }
}

impl From<CaptureMode> for u8 {
    fn from(value: CaptureMode) -> Self {
        value as u8
    }
}

impl From<ReceiverChannel> for u8 {
    fn from(value: ReceiverChannel) -> Self {
        value as u8
    }
}

/// Receiver state item.
///
/// The FIFO block count is only meaningful in [`CaptureMode::Fifo16Bit`];
/// every other mode sends zero.
pub fn receiver_state(
    format: DataFormat,
    state: StreamState,
    mode: CaptureMode,
    fifo_blocks: u8,
) -> ControlItem {
    let fifo_blocks = if mode == CaptureMode::Fifo16Bit {
        fifo_blocks
    } else {
        0x00
    };
    ControlItem::new(
        RECEIVER_STATE,
        vec![format.into(), state.into(), mode.into(), fifo_blocks],
    )
}

/// Start streaming IQ data.
pub fn start_iq(format: DataFormat, mode: CaptureMode, fifo_blocks: u8) -> ControlItem {
    receiver_state(format, StreamState::Run, mode, fifo_blocks)
}

/// Stop streaming IQ data.
pub fn stop_iq() -> ControlItem {
    receiver_state(
        DataFormat::Real,
        StreamState::Stop,
        CaptureMode::Contiguous16Bit,
        0x00,
    )
}

/// Receiver frequency item: `[channel, hz as 5 little-endian bytes]`.
///
/// Only the low 40 bits of `frequency_hz` are transmitted.
pub fn receiver_frequency(channel: ReceiverChannel, frequency_hz: u64) -> ControlItem {
    if frequency_hz > MAX_FREQUENCY_HZ {
        warn!(
            frequency_hz,
            max = MAX_FREQUENCY_HZ,
            "frequency exceeds 40 bits, upper bits truncated"
        );
    }

    let mut parameters = Vec::with_capacity(1 + FREQUENCY_BYTES);
    parameters.push(channel.into());
    parameters.extend_from_slice(&frequency_hz.to_le_bytes()[..FREQUENCY_BYTES]);
    ControlItem::new(RECEIVER_FREQUENCY, parameters)
}
