//! Outbound event queue.
//!
//! Events are produced by:
//! - command handlers (state changes caused by a command)
//! - module stop hooks completing asynchronous work
//! - timers and driver callbacks outside the dispatch context
//!
//! Events are consumed by the NCP loop, which writes each one to the host
//! after the pending command response.
//!
//! ```text
//! ┌─────────────┐     ┌──────────────────┐     ┌──────────────┐
//! │ Handler     │────▶│                  │     │              │
//! │ Stop hook   │────▶│   EventQueue     │────▶│  NCP loop    │
//! │ Timer / ISR │────▶│  (bounded FIFO)  │     │  (consumer)  │
//! └─────────────┘     └──────────────────┘     └──────────────┘
//! ```
//!
//! Frames are stored fully encoded (header + payload) so the consumer only
//! copies bytes to the transport.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use heapless::Vec;
use log::warn;

use crate::config::{DispatchConfig, HEADER_LEN, MAX_ENCODABLE_LEN};
use crate::error::{Error, Result};
use crate::protocol::{Header, LengthFieldWidth};

/// Largest encoded event frame any configuration allows.
pub const MAX_EVENT_FRAME: usize = HEADER_LEN + MAX_ENCODABLE_LEN;

/// Events held before producers start dropping.
pub const EVENT_QUEUE_DEPTH: usize = 8;

/// One encoded event.
pub type EventFrame = Vec<u8, MAX_EVENT_FRAME>;

/// Precomputed header of one event.  The length is the size of the
/// event's fixed part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventDescriptor {
    header: Header,
}

impl EventDescriptor {
    pub const fn new(device_type: u8, class_id: u8, event_id: u8, fixed_len: usize) -> Self {
        Self {
            header: Header::event(device_type, class_id, event_id, fixed_len),
        }
    }

    pub const fn header(&self) -> Header {
        self.header
    }

    pub const fn fixed_len(&self) -> usize {
        self.header.payload_len()
    }
}

/// Bounded FIFO of encoded events, safe to share between contexts.
///
/// Event payloads obey the same size limit as commands and responses.
pub struct EventQueue {
    channel: Channel<CriticalSectionRawMutex, EventFrame, EVENT_QUEUE_DEPTH>,
    max_payload: usize,
}

impl EventQueue {
    /// Queue accepting payloads of at most `max_payload` bytes.  Values
    /// above the header's 11-bit limit are clamped.
    pub const fn new(max_payload: usize) -> Self {
        Self {
            channel: Channel::new(),
            max_payload: if max_payload > MAX_ENCODABLE_LEN {
                MAX_ENCODABLE_LEN
            } else {
                max_payload
            },
        }
    }

    pub fn from_config(config: &DispatchConfig) -> Self {
        Self::new(config.max_payload())
    }

    /// Largest payload an event may carry, header excluded.
    pub fn max_payload(&self) -> usize {
        self.max_payload
    }

    /// Queue an event with only a fixed part.  `fields` must be exactly the
    /// descriptor's fixed length.
    pub fn queue_event(&self, desc: &EventDescriptor, fields: &[u8]) -> Result<()> {
        let fixed = desc.fixed_len();
        if fields.len() != fixed {
            return Err(Error::InvalidParameter);
        }
        if fixed > self.max_payload {
            warn!("events: {fixed}-byte event exceeds {} byte limit", self.max_payload);
            return Err(Error::WouldOverflow);
        }
        let frame = encode(desc.header, fields, &[])?;
        self.push(frame)
    }

    /// Queue an event whose fixed part ends in a one-byte length field
    /// followed by `data`.  The length byte in `fields` is overwritten.
    pub fn queue_event_with_data(
        &self,
        desc: &EventDescriptor,
        fields: &[u8],
        data: &[u8],
    ) -> Result<()> {
        let fixed = desc.fixed_len();
        if fields.len() != fixed {
            return Err(Error::InvalidParameter);
        }
        LengthFieldWidth::U8.check(fixed, data.len())?;
        let total = fixed + data.len();
        if total > self.max_payload {
            warn!("events: {total}-byte event exceeds {} byte limit", self.max_payload);
            return Err(Error::WouldOverflow);
        }

        let mut frame = encode(desc.header.with_len(total), fields, data)?;
        LengthFieldWidth::U8.write(&mut frame[HEADER_LEN..], fixed, data.len());
        self.push(frame)
    }

    /// Oldest queued event.
    pub fn pop(&self) -> Option<EventFrame> {
        self.channel.try_receive().ok()
    }

    pub fn len(&self) -> usize {
        self.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }

    /// Drop every queued event.
    pub fn clear(&self) {
        self.channel.clear();
    }

    fn push(&self, frame: EventFrame) -> Result<()> {
        self.channel.try_send(frame).map_err(|_| {
            warn!("events: queue full, event dropped");
            Error::Failure
        })
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::from_config(&DispatchConfig::default())
    }
}

fn encode(header: Header, fields: &[u8], data: &[u8]) -> Result<EventFrame> {
    let mut frame = EventFrame::new();
    frame
        .extend_from_slice(&header.to_le_bytes())
        .and_then(|()| frame.extend_from_slice(fields))
        .and_then(|()| frame.extend_from_slice(data))
        .map_err(|()| Error::WouldOverflow)?;
    Ok(frame)
}
