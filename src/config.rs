//! Framework configuration and wire layout constants.
//!
//! The header bit layout is fixed at build time by the constants below;
//! everything that may differ between products (payload size, tracing)
//! lives in [`DispatchConfig`] and can be loaded from NVS or provisioning.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Header layout
// ---------------------------------------------------------------------------

/// Size of the packed message header on the wire.
pub const HEADER_LEN: usize = 4;

/// Bits of the first header byte that select the device type.
pub const DEVICE_TYPE_MASK: u8 = 0x78;

/// Flag bit layered onto the device type byte that marks an event.
pub const EVENT_FLAG: u8 = 0x80;

/// Bits of the first header byte that hold the length's high bits.
pub const LEN_HIGH_MASK: u8 = 0x07;

/// Largest payload length the header can express (11 bits).
pub const MAX_ENCODABLE_LEN: usize = ((LEN_HIGH_MASK as usize) << 8) | 0xFF;

/// Size of the payload of a generic error response (one `u16` result).
pub const ERROR_PAYLOAD_LEN: usize = 2;

// ---------------------------------------------------------------------------
// Runtime configuration
// ---------------------------------------------------------------------------

/// Tunable parameters of the dispatch core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Largest payload a command, response, or event may carry (bytes,
    /// excluding the header).  Both singleton packets are sized from this.
    pub max_payload_size: u16,
    /// Include payload bytes of non-sensitive commands in trace logs.
    pub trace_payloads: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_payload_size: 256,
            trace_payloads: true,
        }
    }
}

impl DispatchConfig {
    /// Reject values the header or the error response cannot represent.
    pub fn validate(&self) -> Result<()> {
        let max = self.max_payload_size as usize;
        if max < ERROR_PAYLOAD_LEN || max > MAX_ENCODABLE_LEN {
            return Err(Error::InvalidParameter);
        }
        Ok(())
    }

    /// Maximum payload as a `usize`.
    pub fn max_payload(&self) -> usize {
        self.max_payload_size as usize
    }

    /// Size each singleton packet buffer is allocated with.
    pub fn buffer_len(&self) -> usize {
        HEADER_LEN + self.max_payload()
    }

    /// Load from a JSON provisioning blob and validate.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|_| Error::InvalidParameter)?;
        config.validate()?;
        Ok(config)
    }

    /// Encode for persistent storage.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        postcard::to_allocvec(self).map_err(|_| Error::WouldOverflow)
    }

    /// Decode from persistent storage and validate.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let config: Self = postcard::from_bytes(bytes).map_err(|_| Error::InvalidParameter)?;
        config.validate()?;
        Ok(config)
    }
}
