//! Dispatch context and the routing algorithm.
//!
//! ```text
//!            handle_command(header, payload)
//!                         │
//!                         ▼
//!                 ┌───────────────┐  replaceable with set_delegate()
//!                 │   delegate    │──────────────────────────────┐
//!                 └───────┬───────┘                              │
//!                         ▼ default_delegate                     │
//!   device_type ──▶ Subsystem ──▶ active table ──▶ class_id ──▶ command_id
//!                         │                                      │
//!                         ▼                                      ▼
//!                  handler(&mut ctx) ─────────────▶ response packet
//!                         │ header still SENTINEL?  ─▶ FAILURE
//!                         ▼ not found               ─▶ NOT_SUPPORTED
//!              error response (ids copied, u16 result)
//! ```
//!
//! The context owns the only two packets in the system.  Handlers borrow
//! it mutably for the duration of the call, so a handler may read the
//! command and build the response but cannot hold on to either.

use log::{debug, log_enabled, trace, warn, Level};

use crate::config::DispatchConfig;
use crate::error::{Error, Result};
use crate::events::EventQueue;
use crate::protocol::{Header, Packet};

use super::command::CommandDescriptor;
use super::lock::{CommandLock, FlagLock};
use super::registry::Registry;
use super::subsystem::Subsystem;
use super::table::{Command, CommandHandler};

/// Replaceable handler-invocation function.  Receives the command header
/// and an optional handler that bypasses lookup.
pub type Delegate = fn(&mut DispatchContext, Header, Option<CommandHandler>);

/// Process-wide dispatch state.
pub struct DispatchContext {
    pub(super) config: DispatchConfig,
    pub(super) registry: Registry,
    pub(super) command: Packet,
    pub(super) response: Packet,
    pub(super) delegate: Delegate,
    pub(super) lock: Box<dyn CommandLock>,
    pub(super) current: Option<CommandDescriptor>,
    events: EventQueue,
}

impl DispatchContext {
    /// Allocate both packets and use the default [`FlagLock`].
    pub fn new(config: DispatchConfig) -> Result<Self> {
        Self::with_lock(config, Box::new(FlagLock::new()))
    }

    /// Like [`new`](Self::new) with a platform-supplied lock.
    pub fn with_lock(config: DispatchConfig, lock: Box<dyn CommandLock>) -> Result<Self> {
        config.validate()?;
        let max = config.max_payload();
        debug!("dispatch: packets sized {} bytes", config.buffer_len());
        Ok(Self {
            command: Packet::with_capacity(max),
            response: Packet::with_capacity(max),
            events: EventQueue::from_config(&config),
            config,
            registry: Registry::new(),
            delegate: default_delegate,
            lock,
            current: None,
        })
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    // ── Registry and lifecycle ────────────────────────────────

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Register a subsystem.  Returns `false` if its device type is taken.
    pub fn register(&mut self, subsystem: &Subsystem) -> bool {
        self.registry.register(subsystem)
    }

    /// Start a subsystem (registering it if needed).
    pub fn start(&mut self, subsystem: &Subsystem) -> Result<()> {
        self.registry.start(subsystem)
    }

    // ── Events ────────────────────────────────────────────────

    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    // ── Delegate ──────────────────────────────────────────────

    /// Route every command through `delegate` instead of the default.
    pub fn set_delegate(&mut self, delegate: Delegate) {
        self.delegate = delegate;
    }

    pub fn reset_delegate(&mut self) {
        self.delegate = default_delegate;
    }

    pub(super) fn invoke_delegate(&mut self, header: Header, handler: Option<CommandHandler>) {
        let delegate = self.delegate;
        delegate(self, header, handler);
    }

    // ── Lookup ────────────────────────────────────────────────

    /// Command entry addressed by `header` in the active tables.
    pub fn lookup(&self, header: Header) -> Option<&'static Command> {
        self.registry.find_command(header)
    }

    /// Whether the addressed command is marked sensitive.  Unknown
    /// commands are not.
    pub fn is_sensitive(&self, header: Header) -> bool {
        self.lookup(header).is_some_and(|c| c.meta.sensitive)
    }

    // ── Raw entry ─────────────────────────────────────────────

    /// Dispatch a command without taking the lock.  The response is left
    /// in the response packet.
    pub fn handle_command(&mut self, header: Header, payload: &[u8]) {
        if self.load_command(header, payload).is_err() {
            warn!("dispatch: {header} does not fit {} bytes", self.command.capacity());
            self.response.set_error(header, Error::WouldOverflow);
            return;
        }
        self.invoke_delegate(header, None);
    }

    /// Place a command in the command packet without dispatching it.
    pub fn load_command(&mut self, header: Header, payload: &[u8]) -> Result<()> {
        let capacity = self.command.capacity();
        let announced = header.payload_len();
        if payload.len() > capacity || announced > capacity {
            return Err(Error::WouldOverflow);
        }
        let buf = self.command.buffer_mut();
        buf[..payload.len()].copy_from_slice(payload);
        if announced > payload.len() {
            buf[payload.len()..announced].fill(0);
        }
        self.command.set_header(header);
        Ok(())
    }

    /// Dispatch whatever is in the command packet.
    pub fn handle_loaded_command(&mut self) {
        let header = self.command.header();
        self.invoke_delegate(header, None);
    }

    // ── Packet access ─────────────────────────────────────────

    /// Payload of the command being handled.
    pub fn command_payload(&self) -> &[u8] {
        self.command.payload()
    }

    /// Whole command payload buffer, for filling the fixed part between
    /// `begin_*` and the call.
    pub fn command_payload_mut(&mut self) -> &mut [u8] {
        self.command.buffer_mut()
    }

    pub fn command_packet(&self) -> &Packet {
        &self.command
    }

    pub fn response_packet(&self) -> &Packet {
        &self.response
    }

    fn trace_command(&self, header: Header) {
        if !log_enabled!(Level::Trace) {
            return;
        }
        if self.config.trace_payloads && !self.is_sensitive(header) {
            trace!("dispatch: {header} {:02x?}", self.command.payload());
        } else {
            trace!("dispatch: {header} <redacted>");
        }
    }
}

impl core::fmt::Debug for DispatchContext {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DispatchContext")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("command", &self.command)
            .field("response", &self.response)
            .field("in_flight", &self.current.is_some())
            .finish()
    }
}

/// The default routing algorithm.  Interceptors installed with
/// [`DispatchContext::set_delegate`] may chain to it.
pub fn default_delegate(ctx: &mut DispatchContext, header: Header, handler: Option<CommandHandler>) {
    ctx.command.set_header(header);
    ctx.response.set_header(Header::SENTINEL);

    let handler = handler.or_else(|| ctx.lookup(header).map(|c| c.handler));

    let status = match handler {
        None => Err(Error::NotSupported),
        Some(handler) => {
            ctx.trace_command(header);
            handler(ctx);
            if ctx.response.header().is_sentinel() {
                Err(Error::Failure)
            } else {
                Ok(())
            }
        }
    };

    if let Err(e) = status {
        warn!("dispatch: {header}: {e}");
        ctx.response.set_error(header, e);
    }
}
