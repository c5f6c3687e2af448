//! Command routing and subsystem lifecycle.
//!
//! ```text
//! DispatchContext
//!  ├── Registry ── Subsystem (device_type)
//!  │                ├── started table ── CommandModule (class_id) ── Command (command_id)
//!  │                └── stopped table ── CommandModule ...
//!  ├── command packet ─┐
//!  ├── response packet ┴─ the only shared buffers
//!  ├── delegate (replaceable)
//!  └── lock (one command in flight)
//! ```

pub mod command;
pub mod engine;
pub mod lifecycle;
pub mod lock;
pub mod registry;
pub mod response;
pub mod subsystem;
pub mod table;

pub use command::CommandDescriptor;
pub use engine::{default_delegate, Delegate, DispatchContext};
pub use lock::{CommandLock, FlagLock};
pub use registry::Registry;
pub use response::{set_error_response, ResponseData};
pub use subsystem::{ModuleTable, Subsystem, SubsystemFlag};
pub use table::{Command, CommandHandler, CommandMeta, CommandModule, DeinitFn, InitFn, StopFn};
