//! Network co-processor host loop.
//!
//! Bridges a byte [`Transport`] to the dispatch context.  Each call to
//! [`NcpHost::poll`]:
//!
//! 1. reads whatever bytes the transport has,
//! 2. reassembles them into command frames,
//! 3. dispatches each frame and writes its response,
//! 4. drains the event queue to the transport.
//!
//! ```text
//!  Transport ──read──▶ FrameAssembler ──▶ load_command ──▶ handle_loaded_command
//!      ▲                                                          │
//!      └───────────── write(response frame) ◀─────────────────────┘
//!      └───────────── write(event frames)   ◀──── EventQueue ◀── event filter
//! ```
//!
//! Bytes read but not yet dispatched survive a failed write and are
//! processed by the next poll.

use anyhow::{Context, Result, anyhow};
use log::{debug, warn};

use crate::config::DispatchConfig;
use crate::dispatch::{DispatchContext, set_error_response};
use crate::error::Error;
use crate::protocol::codec::{FrameAssembler, encode_packet};
use crate::protocol::transport::Transport;
use crate::protocol::{Header, MessageType};

const READ_CHUNK: usize = 256;

/// Decides whether an encoded event frame is forwarded to the host.
/// Returning `false` consumes the event locally.
pub type EventFilter = fn(&[u8]) -> bool;

/// Host loop state: reassembly buffer and an outbound frame buffer.
pub struct NcpHost {
    assembler: FrameAssembler,
    rx_buf: [u8; READ_CHUNK],
    /// Undispatched bytes are `rx_buf[rx_start..rx_end]`.
    rx_start: usize,
    rx_end: usize,
    tx_buf: Box<[u8]>,
    event_filter: Option<EventFilter>,
}

impl NcpHost {
    pub fn new(config: &DispatchConfig) -> Self {
        Self {
            assembler: FrameAssembler::new(config.max_payload()),
            rx_buf: [0; READ_CHUNK],
            rx_start: 0,
            rx_end: 0,
            tx_buf: vec![0u8; config.buffer_len()].into_boxed_slice(),
            event_filter: None,
        }
    }

    /// Process events locally before they reach the host.
    pub fn with_event_filter(mut self, filter: EventFilter) -> Self {
        self.event_filter = Some(filter);
        self
    }

    pub fn set_event_filter(&mut self, filter: Option<EventFilter>) {
        self.event_filter = filter;
    }

    /// Abandon a partially received command, e.g. when the platform's
    /// receive timer expires between fragments, along with any bytes not
    /// yet dispatched.
    ///
    /// If a command was cut short the host is told with a
    /// `CommandIncomplete` error frame.  Its ids are zero when even the
    /// header was incomplete.  Returns whether a frame was sent.
    pub fn reset<T: Transport>(&mut self, transport: &mut T) -> Result<bool> {
        let partial = self.assembler.is_partial();
        let header = self.assembler.pending_header();
        self.assembler.reset();
        self.rx_start = 0;
        self.rx_end = 0;
        if !partial {
            return Ok(false);
        }

        warn!("ncp: partial command discarded");
        let header = header.unwrap_or(Header::command(0, 0, 0, 0));
        let len = set_error_response(header, Error::CommandIncomplete, &mut self.tx_buf)
            .ok_or(Error::WouldOverflow)
            .context("ncp: error frame does not fit the transmit buffer")?;
        transport
            .write_all(&self.tx_buf[..len])
            .map_err(|e| anyhow!("{e}"))
            .context("ncp: incomplete-command report failed")?;
        transport
            .flush()
            .map_err(|e| anyhow!("{e:?}"))
            .context("ncp: transport flush failed")?;
        Ok(true)
    }

    /// Bytes read from the transport that are still waiting for dispatch.
    pub fn pending_rx(&self) -> usize {
        self.rx_end - self.rx_start
    }

    /// Run one step.  Returns the number of commands handled.
    pub fn poll<T: Transport>(&mut self, ctx: &mut DispatchContext, transport: &mut T) -> Result<usize> {
        let mut handled = 0;

        if self.rx_start == self.rx_end && transport.available() {
            let n = transport
                .read(&mut self.rx_buf)
                .map_err(|e| anyhow!("{e:?}"))
                .context("ncp: transport read failed")?;
            self.rx_start = 0;
            self.rx_end = n;
        }

        while self.rx_start < self.rx_end {
            let (used, frame) = self.assembler.feed(&self.rx_buf[self.rx_start..self.rx_end]);
            self.rx_start += used;
            let Some(header) = frame else { continue };

            if header.message_type() == MessageType::Event {
                warn!("ncp: host sent event {header}, ignored");
                continue;
            }

            let len = match ctx.load_command(header, self.assembler.payload()) {
                Ok(()) => {
                    ctx.handle_loaded_command();
                    encode_packet(ctx.response_packet(), &mut self.tx_buf)
                }
                Err(e) => set_error_response(header, e, &mut self.tx_buf),
            }
            .ok_or(Error::WouldOverflow)
            .context("ncp: response does not fit the transmit buffer")?;

            handled += 1;
            transport
                .write_all(&self.tx_buf[..len])
                .map_err(|e| anyhow!("{e}"))
                .context("ncp: response write failed")?;
        }

        let mut events = 0;
        while let Some(frame) = ctx.events().pop() {
            if let Some(filter) = self.event_filter {
                if !filter(&frame) {
                    debug!("ncp: event consumed locally");
                    continue;
                }
            }
            transport
                .write_all(&frame)
                .map_err(|e| anyhow!("{e}"))
                .context("ncp: event write failed")?;
            events += 1;
        }

        if handled > 0 || events > 0 {
            transport
                .flush()
                .map_err(|e| anyhow!("{e:?}"))
                .context("ncp: transport flush failed")?;
            debug!("ncp: {handled} command(s), {events} event(s)");
        }

        Ok(handled)
    }
}
