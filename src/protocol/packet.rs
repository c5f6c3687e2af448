//! Packet buffers and trailing variable-length arrays.
//!
//! A [`Packet`] is a header plus a payload buffer sized to the configured
//! maximum.  Only two live for the whole process (the command and the
//! response), owned by the dispatch context.
//!
//! Messages with variable-length data end their fixed part with a length
//! field, immediately followed by the data:
//!
//! ```text
//! ┌──────────────── fixed part ───────────────┬───────────────┐
//! │ fields ...                   │ len (1|2 B) │ data (len B)  │
//! └──────────────────────────────┴─────────────┴───────────────┘
//! ```

use crate::config::{ERROR_PAYLOAD_LEN, HEADER_LEN};
use crate::error::{Error, Result};

use super::header::Header;

// ---------------------------------------------------------------------------
// Trailing array length field
// ---------------------------------------------------------------------------

/// Width of the length prefix of a trailing array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthFieldWidth {
    /// `uint8array`: one length byte, at most 255 data bytes.
    U8,
    /// `byte_array`: little-endian `u16` length.
    U16,
}

impl LengthFieldWidth {
    /// Bytes occupied by the length field.
    pub const fn size(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::U16 => 2,
        }
    }

    /// Largest data length the field can hold.
    pub const fn max_len(self) -> usize {
        match self {
            Self::U8 => u8::MAX as usize,
            Self::U16 => u16::MAX as usize,
        }
    }

    /// Check that `data_len` fits the field and that a fixed part of
    /// `fixed_len` bytes can end with it.
    pub const fn check(self, fixed_len: usize, data_len: usize) -> Result<()> {
        if fixed_len < self.size() {
            return Err(Error::InvalidParameter);
        }
        if data_len > self.max_len() {
            return Err(Error::WouldOverflow);
        }
        Ok(())
    }

    /// Write `data_len` into the field that ends at `payload[fixed_len]`.
    /// Ranges must have been checked with [`check`](Self::check).
    pub(crate) fn write(self, payload: &mut [u8], fixed_len: usize, data_len: usize) {
        let at = fixed_len - self.size();
        match self {
            Self::U8 => payload[at] = data_len as u8,
            Self::U16 => payload[at..fixed_len].copy_from_slice(&(data_len as u16).to_le_bytes()),
        }
    }

    /// Read the field that ends at `payload[fixed_len]`.
    pub fn read(self, payload: &[u8], fixed_len: usize) -> Option<usize> {
        let at = fixed_len.checked_sub(self.size())?;
        match self {
            Self::U8 => payload.get(at).map(|b| *b as usize),
            Self::U16 => payload
                .get(at..fixed_len)
                .map(|b| u16::from_le_bytes([b[0], b[1]]) as usize),
        }
    }
}

// ---------------------------------------------------------------------------
// Packet
// ---------------------------------------------------------------------------

/// Header plus a fixed-capacity payload buffer.
pub struct Packet {
    header: Header,
    payload: Box<[u8]>,
}

impl Packet {
    /// Allocate a packet able to carry `max_payload` bytes.
    pub fn with_capacity(max_payload: usize) -> Self {
        Self {
            header: Header::SENTINEL,
            payload: vec![0u8; max_payload].into_boxed_slice(),
        }
    }

    pub fn header(&self) -> Header {
        self.header
    }

    pub fn set_header(&mut self, header: Header) {
        self.header = header;
    }

    /// Payload capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.payload.len()
    }

    /// The payload bytes announced by the header (clamped to capacity).
    pub fn payload(&self) -> &[u8] {
        let len = self.header.payload_len().min(self.payload.len());
        &self.payload[..len]
    }

    /// The whole payload buffer, regardless of the header length.
    pub fn buffer(&self) -> &[u8] {
        &self.payload
    }

    pub fn buffer_mut(&mut self) -> &mut [u8] {
        &mut self.payload
    }

    /// The result code every response carries at payload offset 0.
    pub fn result(&self) -> u16 {
        u16::from_le_bytes([self.payload[0], self.payload[1]])
    }

    pub fn set_result(&mut self, code: u16) {
        self.payload[..2].copy_from_slice(&code.to_le_bytes());
    }

    /// Trailing array length stored at the end of a fixed part.
    pub fn array_len(&self, width: LengthFieldWidth, fixed_len: usize) -> Option<usize> {
        width.read(&self.payload, fixed_len)
    }

    /// Overwrite with a generic error response for `original`.
    pub fn set_error(&mut self, original: Header, error: Error) {
        self.header = error_response_header(original);
        self.set_result(error.code());
    }

    /// Copy header and payload into `out`.  Returns the frame length, or
    /// `None` if `out` is too small.
    pub fn write_frame(&self, out: &mut [u8]) -> Option<usize> {
        let payload = self.payload();
        let total = HEADER_LEN + payload.len();
        if out.len() < total {
            return None;
        }
        out[..HEADER_LEN].copy_from_slice(&self.header.to_le_bytes());
        out[HEADER_LEN..total].copy_from_slice(payload);
        Some(total)
    }
}

impl core::fmt::Debug for Packet {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Packet")
            .field("header", &self.header)
            .field("capacity", &self.payload.len())
            .finish()
    }
}

/// Header of the generic error response to `original`: ids copied, device
/// type kept, event flag cleared, payload = one `u16` result.
pub const fn error_response_header(original: Header) -> Header {
    Header::command(
        original.device_type(),
        original.class_id(),
        original.command_id(),
        ERROR_PAYLOAD_LEN,
    )
}
