//! Command tables and command modules.
//!
//! A module (one "class") is a `static` table of commands plus three
//! optional lifecycle hooks:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │ CommandModule  class_id = 0x01  "system"             │
//! │  ┌────────────┬──────────────────┬───────────┐       │
//! │  │ command_id │ handler          │ sensitive │       │
//! │  ├────────────┼──────────────────┼───────────┤       │
//! │  │ 0x00       │ fn(&mut ctx)     │ false     │       │
//! │  │ 0x01       │ fn(&mut ctx)     │ true      │       │
//! │  └────────────┴──────────────────┴───────────┘       │
//! │  init:   Option<fn(&Subsystem) -> Result<()>>        │
//! │  stop:   Option<fn(&Subsystem)>                      │
//! │  deinit: Option<fn(&Subsystem)>                      │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! Everything here is `const`-constructible so tables live in flash.

use core::fmt;

use crate::error::Result;

use super::engine::DispatchContext;
use super::subsystem::Subsystem;

/// Command handler.  Reads its input from
/// [`DispatchContext::command_payload`] and writes a response through the
/// response API; leaving the response unset signals failure.
pub type CommandHandler = fn(&mut DispatchContext);

/// Module initialisation hook, run in table order on start.
pub type InitFn = fn(&Subsystem) -> Result<()>;

/// Module stop hook, run in reverse table order.  May register
/// asynchronous work with [`Subsystem::stop_ongoing`].
pub type StopFn = fn(&Subsystem);

/// Module teardown hook, run in reverse table order.
pub type DeinitFn = fn(&Subsystem);

/// Per-command metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommandMeta {
    /// Payload must never appear in logs.
    pub sensitive: bool,
}

/// One routable command.
#[derive(Clone, Copy)]
pub struct Command {
    pub command_id: u8,
    pub handler: CommandHandler,
    pub meta: CommandMeta,
}

impl Command {
    pub const fn new(command_id: u8, handler: CommandHandler) -> Self {
        Self {
            command_id,
            handler,
            meta: CommandMeta { sensitive: false },
        }
    }

    /// Mark the command's payload as sensitive.
    pub const fn sensitive(mut self) -> Self {
        self.meta.sensitive = true;
        self
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("command_id", &self.command_id)
            .field("meta", &self.meta)
            .finish()
    }
}

/// A class of commands belonging to one subsystem.
pub struct CommandModule {
    pub class_id: u8,
    pub name: &'static str,
    pub commands: &'static [Command],
    pub init: Option<InitFn>,
    pub stop: Option<StopFn>,
    pub deinit: Option<DeinitFn>,
}

impl CommandModule {
    pub const fn new(class_id: u8, name: &'static str, commands: &'static [Command]) -> Self {
        Self {
            class_id,
            name,
            commands,
            init: None,
            stop: None,
            deinit: None,
        }
    }

    pub const fn with_init(mut self, init: InitFn) -> Self {
        self.init = Some(init);
        self
    }

    pub const fn with_stop(mut self, stop: StopFn) -> Self {
        self.stop = Some(stop);
        self
    }

    pub const fn with_deinit(mut self, deinit: DeinitFn) -> Self {
        self.deinit = Some(deinit);
        self
    }

    /// First command with a matching id.
    pub fn find(&self, command_id: u8) -> Option<&'static Command> {
        self.commands.iter().find(|c| c.command_id == command_id)
    }
}

impl fmt::Debug for CommandModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandModule")
            .field("class_id", &self.class_id)
            .field("name", &self.name)
            .field("commands", &self.commands.len())
            .finish()
    }
}
