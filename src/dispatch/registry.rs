//! Registry of subsystems, in registration order.

use log::info;

use crate::protocol::Header;

use super::subsystem::{Subsystem, SubsystemFlag};
use super::table::{Command, CommandModule};

/// Ordered set of registered subsystems, unique by device type.
#[derive(Debug, Default)]
pub struct Registry {
    subsystems: Vec<Subsystem>,
}

impl Registry {
    pub const fn new() -> Self {
        Self {
            subsystems: Vec::new(),
        }
    }

    /// Append `subsystem` unless one with the same device type is already
    /// registered.  Returns `true` if it was appended.
    pub fn register(&mut self, subsystem: &Subsystem) -> bool {
        if self.find(subsystem.device_type()).is_some() {
            return false;
        }
        subsystem.update_flags(0, SubsystemFlag::Registered.mask());
        self.subsystems.push(subsystem.clone());
        info!(
            "registry: {} registered as device 0x{:02x}",
            subsystem.name(),
            subsystem.device_type()
        );
        true
    }

    /// Registered subsystem for a device type.
    pub fn find(&self, device_type: u8) -> Option<&Subsystem> {
        self.subsystems
            .iter()
            .find(|s| s.device_type() == device_type)
    }

    /// Module of the subsystem's active table addressed by `header`.
    pub fn find_module(&self, header: Header) -> Option<&'static CommandModule> {
        self.find(header.device_type())?
            .find_module(header.class_id())
    }

    /// Command addressed by `header`, if routable.
    pub fn find_command(&self, header: Header) -> Option<&'static Command> {
        self.find_module(header)?.find(header.command_id())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Subsystem> {
        self.subsystems.iter()
    }

    pub fn len(&self) -> usize {
        self.subsystems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subsystems.is_empty()
    }
}
