//! Status codes for the command core.
//!
//! Every fallible operation returns [`Result`].  The variants map one-to-one
//! onto the 16-bit status codes carried in error responses, so a status can
//! travel over the wire and come back as the same `Error`.  All variants are
//! `Copy` so they can be returned from handlers and hooks without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Wire status codes
// ---------------------------------------------------------------------------

/// Status code of a successful command.
pub const STATUS_OK: u16 = 0x0000;

const STATUS_FAIL: u16 = 0x0001;
const STATUS_INVALID_STATE: u16 = 0x0002;
const STATUS_BUSY: u16 = 0x0004;
const STATUS_NOT_SUPPORTED: u16 = 0x000F;
const STATUS_WOULD_OVERFLOW: u16 = 0x001D;
const STATUS_INVALID_PARAMETER: u16 = 0x0021;
const STATUS_COMMAND_INCOMPLETE: u16 = 0x0049;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Every non-OK status the command core can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Error {
    /// A handler ran but did not produce a response.
    Failure,
    /// An operation was called in the wrong phase (e.g. no command in flight).
    InvalidState,
    /// Another command is already in flight.
    LockUnavailable,
    /// No subsystem, module, or command matches the header.
    NotSupported,
    /// The payload would not fit the packet or its length field.
    WouldOverflow,
    /// A descriptor or configuration value is malformed.
    InvalidParameter,
    /// A command was only partially received before the link gave up on it.
    CommandIncomplete,
    /// Any other status reported by a handler or module hook.
    Code(u16),
}

impl Error {
    /// The 16-bit wire status code.
    pub const fn code(self) -> u16 {
        match self {
            Self::Failure => STATUS_FAIL,
            Self::InvalidState => STATUS_INVALID_STATE,
            Self::LockUnavailable => STATUS_BUSY,
            Self::NotSupported => STATUS_NOT_SUPPORTED,
            Self::WouldOverflow => STATUS_WOULD_OVERFLOW,
            Self::InvalidParameter => STATUS_INVALID_PARAMETER,
            Self::CommandIncomplete => STATUS_COMMAND_INCOMPLETE,
            Self::Code(code) => code,
        }
    }

    /// Decode a wire status code.  Returns `None` for [`STATUS_OK`].
    pub const fn from_code(code: u16) -> Option<Self> {
        match code {
            STATUS_OK => None,
            STATUS_FAIL => Some(Self::Failure),
            STATUS_INVALID_STATE => Some(Self::InvalidState),
            STATUS_BUSY => Some(Self::LockUnavailable),
            STATUS_NOT_SUPPORTED => Some(Self::NotSupported),
            STATUS_WOULD_OVERFLOW => Some(Self::WouldOverflow),
            STATUS_INVALID_PARAMETER => Some(Self::InvalidParameter),
            STATUS_COMMAND_INCOMPLETE => Some(Self::CommandIncomplete),
            other => Some(Self::Code(other)),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failure => write!(f, "handler produced no response"),
            Self::InvalidState => write!(f, "invalid state"),
            Self::LockUnavailable => write!(f, "command already in flight"),
            Self::NotSupported => write!(f, "command not supported"),
            Self::WouldOverflow => write!(f, "payload would overflow"),
            Self::InvalidParameter => write!(f, "invalid parameter"),
            Self::CommandIncomplete => write!(f, "command received only partially"),
            Self::Code(code) => write!(f, "status 0x{code:04x}"),
        }
    }
}

impl core::error::Error for Error {}

/// Convert a wire status code into a `Result`.
pub const fn status_from_code(code: u16) -> Result<()> {
    match Error::from_code(code) {
        None => Ok(()),
        Some(e) => Err(e),
    }
}

/// The wire status code of a `Result`.
pub const fn status_code(result: Result<()>) -> u16 {
    match result {
        Ok(()) => STATUS_OK,
        Err(e) => e.code(),
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
