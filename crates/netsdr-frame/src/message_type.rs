//! The 3-bit message type carried in the top of the header word.
//!
//! The same numeric value means different things depending on who sent the
//! frame, so each value has a host-originated and a target-originated name.

/// A 3-bit message type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageType(u8);

impl MessageType {
    // Host-originated.

    /// Set a control item.
    pub const SET_CONTROL_ITEM: Self = Self(0b000);
    /// Request the current value of a control item.
    pub const REQUEST_CURRENT_CONTROL_ITEM: Self = Self(0b001);
    /// Request the allowed range of a control item.
    pub const REQUEST_CONTROL_ITEM_RANGE: Self = Self(0b010);
    /// Data item acknowledgement (either direction).
    pub const DATA_ITEM_ACK: Self = Self(0b011);
    /// Data item on channel 0.
    pub const DATA_ITEM_0: Self = Self(0b100);
    /// Data item on channel 1.
    pub const DATA_ITEM_1: Self = Self(0b101);
    /// Data item on channel 2.
    pub const DATA_ITEM_2: Self = Self(0b110);
    /// Data item on channel 3.
    pub const DATA_ITEM_3: Self = Self(0b111);

    // Target-originated aliases.

    /// Response to a set or request (ACK), or a NAK when the length is 2.
    pub const RESPONSE: Self = Self(0b000);
    /// Control item pushed by the target without a preceding request.
    pub const UNSOLICITED_CONTROL_ITEM: Self = Self(0b001);
    /// Response to a range request.
    pub const RESPONSE_TO_RANGE: Self = Self(0b010);

    /// Build a message type from the low 3 bits of `bits`.
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & 0b111)
    }

    /// The raw 3-bit value.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Human-readable name when the frame was sent by the host.
    pub fn host_name(self) -> &'static str {
        match self.0 {
            0 => "SET_CONTROL_ITEM",
            1 => "REQUEST_CURRENT_CONTROL_ITEM",
            2 => "REQUEST_CONTROL_ITEM_RANGE",
            3 => "DATA_ITEM_ACK",
            _ => "DATA_ITEM",
        }
    }

    /// Human-readable name when the frame was sent by the target.
    pub fn target_name(self) -> &'static str {
        match self.0 {
            0 => "RESPONSE",
            1 => "UNSOLICITED_CONTROL_ITEM",
            2 => "RESPONSE_TO_RANGE",
            3 => "DATA_ITEM_ACK",
            _ => "DATA_ITEM",
        }
    }

    /// Data item channel (0-3) for types 4-7.
    pub fn data_item_channel(self) -> Option<u8> {
        (self.0 >= 0b100).then(|| self.0 - 0b100)
    }
}

impl From<MessageType> for u8 {
    fn from(value: MessageType) -> Self {
        value.bits()
    }
}
