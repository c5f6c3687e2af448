//! Packed 32-bit message header.
//!
//! ```text
//!  byte 0                    byte 1      byte 2     byte 3
//! ┌───┬──────────┬─────────┬───────────┬──────────┬────────────┐
//! │evt│ dev type │ len[10:8]│ len[7:0] │ class id │ command id │
//! │ 7 │   6..3   │   2..0   │          │          │            │
//! └───┴──────────┴─────────┴───────────┴──────────┴────────────┘
//! ```
//!
//! The header travels little-endian, so byte 0 is the least significant
//! byte of the `u32`.  `len` is the payload length, header excluded.

use core::fmt;

use crate::config::{DEVICE_TYPE_MASK, EVENT_FLAG, HEADER_LEN, LEN_HIGH_MASK, MAX_ENCODABLE_LEN};

/// Whether a message is a command/response or an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    /// Commands and their responses share the cleared flag.
    CommandResponse,
    /// Unsolicited event.
    Event,
}

impl MessageType {
    const fn flag(self) -> u8 {
        match self {
            Self::CommandResponse => 0,
            Self::Event => EVENT_FLAG,
        }
    }
}

/// A packed message header.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Header(u32);

impl Header {
    /// The all-zero header.  A response packet still carrying it after a
    /// handler returns means the handler produced no response.
    pub const SENTINEL: Self = Self(0);

    /// Build a header.  `len` is truncated to the encodable 11 bits; callers
    /// check ranges before building.
    pub const fn new(
        message_type: MessageType,
        device_type: u8,
        class_id: u8,
        command_id: u8,
        len: usize,
    ) -> Self {
        let len = (len & MAX_ENCODABLE_LEN) as u32;
        let type_byte = (message_type.flag() | (device_type & DEVICE_TYPE_MASK)) as u32;
        Self(
            ((command_id as u32) << 24)
                | ((class_id as u32) << 16)
                | ((len & 0xFF) << 8)
                | (len >> 8)
                | type_byte,
        )
    }

    /// Header of a command (or response) for the given ids.
    pub const fn command(device_type: u8, class_id: u8, command_id: u8, len: usize) -> Self {
        Self::new(MessageType::CommandResponse, device_type, class_id, command_id, len)
    }

    /// Header of an event for the given ids.
    pub const fn event(device_type: u8, class_id: u8, command_id: u8, len: usize) -> Self {
        Self::new(MessageType::Event, device_type, class_id, command_id, len)
    }

    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn device_type(self) -> u8 {
        (self.0 as u8) & DEVICE_TYPE_MASK
    }

    pub const fn message_type(self) -> MessageType {
        if (self.0 as u8) & EVENT_FLAG == 0 {
            MessageType::CommandResponse
        } else {
            MessageType::Event
        }
    }

    pub const fn class_id(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub const fn command_id(self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// Payload length announced by the header.
    pub const fn payload_len(self) -> usize {
        ((((self.0 as u8) & LEN_HIGH_MASK) as usize) << 8) | (((self.0 >> 8) & 0xFF) as usize)
    }

    /// Total frame length on the wire (header plus payload).
    pub const fn frame_len(self) -> usize {
        HEADER_LEN + self.payload_len()
    }

    /// Same ids and type, different payload length.
    pub const fn with_len(self, len: usize) -> Self {
        Self::new(
            self.message_type(),
            self.device_type(),
            self.class_id(),
            self.command_id(),
            len,
        )
    }

    /// Same ids and length, different message type.
    pub const fn with_type(self, message_type: MessageType) -> Self {
        Self::new(
            message_type,
            self.device_type(),
            self.class_id(),
            self.command_id(),
            self.payload_len(),
        )
    }

    pub const fn is_sentinel(self) -> bool {
        self.0 == 0
    }

    pub const fn to_le_bytes(self) -> [u8; HEADER_LEN] {
        self.0.to_le_bytes()
    }

    pub const fn from_le_bytes(bytes: [u8; HEADER_LEN]) -> Self {
        Self(u32::from_le_bytes(bytes))
    }
}

impl fmt::Debug for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Header")
            .field("type", &self.message_type())
            .field("dev", &format_args!("0x{:02x}", self.device_type()))
            .field("class", &format_args!("0x{:02x}", self.class_id()))
            .field("cmd", &format_args!("0x{:02x}", self.command_id()))
            .field("len", &self.payload_len())
            .finish()
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02x}:{:02x}:{:02x}/{}",
            self.device_type(),
            self.class_id(),
            self.command_id(),
            self.payload_len()
        )
    }
}
