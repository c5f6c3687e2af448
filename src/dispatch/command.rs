//! Locked command builder.
//!
//! Issuing a command from application code:
//!
//! ```text
//! begin_fixed_command(&DESC)            lock taken, header written
//!   command_payload_mut()[..] = params  fixed part filled by caller
//! call_and_end(&DESC)                   delegate runs, lock released,
//!                                       result read from the response
//! ```
//!
//! `begin_variable_command` also appends a trailing array and sets its
//! length field.  Every size check happens before the lock is taken, so a
//! rejected command leaves nothing to clean up.

use core::fmt;

use crate::error::{Error, Result, status_from_code};
use crate::protocol::{Header, LengthFieldWidth};

use super::engine::DispatchContext;
use super::table::CommandHandler;

/// Precomputed header and handler of one command.  The header's length is
/// the size of the command's fixed part.
#[derive(Clone, Copy)]
pub struct CommandDescriptor {
    pub header: Header,
    pub handler: CommandHandler,
}

impl CommandDescriptor {
    pub const fn new(header: Header, handler: CommandHandler) -> Self {
        Self { header, handler }
    }
}

impl fmt::Debug for CommandDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDescriptor")
            .field("header", &self.header)
            .finish()
    }
}

impl DispatchContext {
    /// Take the lock and start a command with no variable data.
    pub fn begin_fixed_command(&mut self, desc: &CommandDescriptor) -> Result<()> {
        if desc.header.payload_len() > self.command.capacity() {
            return Err(Error::WouldOverflow);
        }
        self.lock.acquire()?;
        self.current = Some(*desc);
        self.command.set_header(desc.header);
        Ok(())
    }

    /// Take the lock and start a command whose fixed part ends with a
    /// length field of `width`, followed by `data`.
    pub fn begin_variable_command(
        &mut self,
        desc: &CommandDescriptor,
        width: LengthFieldWidth,
        data: &[u8],
    ) -> Result<()> {
        let fixed = desc.header.payload_len();
        let total = fixed + data.len();
        if total > self.command.capacity() {
            return Err(Error::WouldOverflow);
        }
        width.check(fixed, data.len())?;

        self.lock.acquire()?;
        self.current = Some(*desc);
        self.command.set_header(desc.header.with_len(total));

        let buf = self.command.buffer_mut();
        buf[fixed..total].copy_from_slice(data);
        width.write(buf, fixed, data.len());
        Ok(())
    }

    /// Run the current command through the delegate.  The lock stays held
    /// so output parameters can be read from the response; finish with
    /// [`end_command`](Self::end_command).
    pub fn call_delegate_for_command(&mut self) -> Result<()> {
        let desc = self.current.ok_or(Error::InvalidState)?;
        let header = self.command.header();
        self.invoke_delegate(header, Some(desc.handler));
        status_from_code(self.response.result())
    }

    /// Forget the current command and release the lock.
    pub fn end_command(&mut self) {
        self.current = None;
        self.lock.release();
    }

    /// [`call_delegate_for_command`](Self::call_delegate_for_command)
    /// followed by [`end_command`](Self::end_command).
    pub fn call_and_end(&mut self) -> Result<()> {
        let status = self.call_delegate_for_command();
        self.end_command();
        status
    }

    /// True while a command started with `begin_*` has not ended.
    pub fn command_in_flight(&self) -> bool {
        self.current.is_some()
    }

    /// True while the command lock is held.
    pub fn is_locked(&self) -> bool {
        self.lock.is_held()
    }
}
