//! Header-driven command dispatch and subsystem lifecycle core.
//!
//! A host sends binary commands; each carries a 32-bit header naming a
//! subsystem (device type), a command class and a command id.  The core
//! routes the command to the handler registered for it, and every command
//! yields exactly one well-formed response.  Subsystems are started and
//! stopped independently; each exposes one command table while started and
//! another while stopped.
//!
//! Platform specifics (transport, lock, logger backend) are supplied by the
//! embedding firmware through the traits in [`protocol::transport`] and
//! [`dispatch::lock`].

#![deny(unused_must_use)]

pub mod config;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod ncp;
pub mod protocol;

pub use config::DispatchConfig;
pub use dispatch::{
    Command, CommandDescriptor, CommandModule, DispatchContext, ResponseData, Subsystem,
};
pub use error::{Error, Result};
pub use events::{EventDescriptor, EventQueue};
pub use ncp::NcpHost;
pub use protocol::{Header, LengthFieldWidth, MessageType, Packet};
