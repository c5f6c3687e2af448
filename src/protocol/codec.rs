//! Header-delimited frame codec.
//!
//! Wire format:
//! ```text
//! ┌─────────────┬────────────────────────────┐
//! │ Header (4B) │ Payload (header.len bytes) │
//! │ LE u32      │                            │
//! └─────────────┴────────────────────────────┘
//! ```
//!
//! The assembler accumulates incoming bytes and yields complete frames.
//! This handles partial reads: a single `Transport::read` call
//! may return part of the header, part of the payload, or several frames
//! back to back.  The caller loops on [`FrameAssembler::feed`] until every
//! byte has been consumed.

use log::warn;

use crate::config::HEADER_LEN;

use super::header::Header;
use super::packet::Packet;

/// Assembler state machine.
enum AssemblerState {
    /// Waiting for header bytes.
    ReadingHeader { collected: usize },
    /// Header received, reading payload.
    ReadingPayload {
        header: Header,
        expected: usize,
        collected: usize,
    },
}

/// Streaming frame assembler.
pub struct FrameAssembler {
    state: AssemblerState,
    header_buf: [u8; HEADER_LEN],
    payload_buf: Box<[u8]>,
    /// Payload length of the most recently completed frame.
    completed_len: usize,
    dropped: u32,
}

impl FrameAssembler {
    /// Create an assembler that accepts payloads up to `max_payload` bytes.
    pub fn new(max_payload: usize) -> Self {
        Self {
            state: AssemblerState::ReadingHeader { collected: 0 },
            header_buf: [0; HEADER_LEN],
            payload_buf: vec![0u8; max_payload].into_boxed_slice(),
            completed_len: 0,
            dropped: 0,
        }
    }

    /// Feed bytes into the assembler.
    ///
    /// Returns how many bytes of `data` were consumed and, when a frame
    /// completed, its header.  The payload of that frame is available from
    /// [`payload`](Self::payload) until the next call.
    pub fn feed(&mut self, data: &[u8]) -> (usize, Option<Header>) {
        let mut offset = 0;

        while offset < data.len() {
            match &mut self.state {
                AssemblerState::ReadingHeader { collected } => {
                    let needed = HEADER_LEN - *collected;
                    let to_copy = needed.min(data.len() - offset);

                    self.header_buf[*collected..*collected + to_copy]
                        .copy_from_slice(&data[offset..offset + to_copy]);

                    *collected += to_copy;
                    offset += to_copy;

                    if *collected == HEADER_LEN {
                        let header = Header::from_le_bytes(self.header_buf);
                        let expected = header.payload_len();

                        if expected > self.payload_buf.len() {
                            // Cannot hold it: resynchronise on the next header.
                            warn!("codec: frame {header} exceeds {} bytes, dropped", self.payload_buf.len());
                            self.dropped = self.dropped.saturating_add(1);
                            self.state = AssemblerState::ReadingHeader { collected: 0 };
                            continue;
                        }

                        if expected == 0 {
                            self.state = AssemblerState::ReadingHeader { collected: 0 };
                            self.completed_len = 0;
                            return (offset, Some(header));
                        }

                        self.state = AssemblerState::ReadingPayload {
                            header,
                            expected,
                            collected: 0,
                        };
                    }
                }

                AssemblerState::ReadingPayload {
                    header,
                    expected,
                    collected,
                } => {
                    let needed = *expected - *collected;
                    let to_copy = needed.min(data.len() - offset);

                    self.payload_buf[*collected..*collected + to_copy]
                        .copy_from_slice(&data[offset..offset + to_copy]);

                    *collected += to_copy;
                    offset += to_copy;

                    if *collected == *expected {
                        let header = *header;
                        self.completed_len = *expected;
                        self.state = AssemblerState::ReadingHeader { collected: 0 };
                        return (offset, Some(header));
                    }
                }
            }
        }

        (offset, None)
    }

    /// Payload of the most recently completed frame.
    pub fn payload(&self) -> &[u8] {
        &self.payload_buf[..self.completed_len]
    }

    /// True while a frame is partially received.
    pub fn is_partial(&self) -> bool {
        !matches!(self.state, AssemblerState::ReadingHeader { collected: 0 })
    }

    /// Header of the frame being received, once all of it has arrived.
    pub fn pending_header(&self) -> Option<Header> {
        match self.state {
            AssemblerState::ReadingPayload { header, .. } => Some(header),
            AssemblerState::ReadingHeader { .. } => None,
        }
    }

    /// Frames discarded because they announced an oversized payload.
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    /// Discard a partial frame (e.g. after a receive timeout or reconnect).
    pub fn reset(&mut self) {
        self.state = AssemblerState::ReadingHeader { collected: 0 };
    }
}

/// Encode a packet as a header-delimited frame.
///
/// Writes `[LE-u32 header][payload]` into `out_buf`.
/// Returns the total number of bytes written.
pub fn encode_packet(packet: &Packet, out_buf: &mut [u8]) -> Option<usize> {
    packet.write_frame(out_buf)
}
