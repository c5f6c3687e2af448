//! Response construction.
//!
//! Handlers build their response in the context's response packet.  A
//! response with variable data ends its fixed part with a one-byte length
//! field:
//!
//! ```text
//! header_template.len = fixed part size
//! ┌──────────── fixed part ────────────┬──────────┐
//! │ result (u16) │ fields ... │ len u8 │ data ... │
//! └──────────────┴────────────┴────────┴──────────┘
//! ```

use crate::config::{ERROR_PAYLOAD_LEN, HEADER_LEN};
use crate::error::{Error, Result};
use crate::protocol::packet::error_response_header;
use crate::protocol::{Header, LengthFieldWidth, MessageType, Packet};

use super::engine::DispatchContext;

/// Source of the trailing array of a response.
#[derive(Debug, Clone, Copy)]
pub enum ResponseData<'a> {
    /// Copy these bytes into place.
    Copy(&'a [u8]),
    /// This many bytes were already written through
    /// [`DispatchContext::response_data_buf`].
    Resident(usize),
}

impl ResponseData<'_> {
    pub fn len(&self) -> usize {
        match self {
            Self::Copy(data) => data.len(),
            Self::Resident(len) => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DispatchContext {
    /// Set the response header and return the packet for filling in.
    pub fn create_response(&mut self, header: Header) -> &mut Packet {
        self.response.set_header(header);
        &mut self.response
    }

    /// Build a response whose fixed part (sized by `header_template`) ends
    /// in a one-byte length field followed by `data`.
    pub fn create_response_with_data(
        &mut self,
        header_template: Header,
        data: ResponseData<'_>,
    ) -> Result<&mut Packet> {
        let fixed = header_template.payload_len();
        let data_len = data.len();
        LengthFieldWidth::U8.check(fixed, data_len)?;
        let total = fixed + data_len;
        if total > self.response.capacity() {
            return Err(Error::WouldOverflow);
        }

        let buf = self.response.buffer_mut();
        LengthFieldWidth::U8.write(buf, fixed, data_len);
        if let ResponseData::Copy(bytes) = data {
            buf[fixed..total].copy_from_slice(bytes);
        }

        let header = Header::new(
            MessageType::CommandResponse,
            header_template.device_type(),
            header_template.class_id(),
            header_template.command_id(),
            total,
        );
        Ok(self.create_response(header))
    }

    /// Region after the fixed part of `header_template`, for writing
    /// response data in place before
    /// `create_response_with_data(.., ResponseData::Resident(n))`.
    pub fn response_data_buf(&mut self, header_template: Header) -> &mut [u8] {
        let fixed = header_template.payload_len();
        let buf = self.response.buffer_mut();
        let start = fixed.min(buf.len());
        let end = (fixed + u8::MAX as usize).min(buf.len());
        &mut buf[start..end]
    }

    /// Result code of the current response.
    pub fn response_result(&self) -> u16 {
        self.response.result()
    }

    /// Full size of a packet buffer, header included.
    pub fn message_size(&self) -> usize {
        HEADER_LEN + self.response.capacity()
    }
}

/// Write an error response for `header` straight into `out`, bypassing the
/// response packet.  Returns the bytes written, or `None` if `out` is too
/// small.
pub fn set_error_response(header: Header, error: Error, out: &mut [u8]) -> Option<usize> {
    let total = HEADER_LEN + ERROR_PAYLOAD_LEN;
    if out.len() < total {
        return None;
    }
    out[..HEADER_LEN].copy_from_slice(&error_response_header(header).to_le_bytes());
    out[HEADER_LEN..total].copy_from_slice(&error.code().to_le_bytes());
    Some(total)
}
