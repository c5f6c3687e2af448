//! Host link boundary.
//!
//! The NCP loop only needs a non-blocking byte pipe.  Board support code
//! implements [`Transport`] for its UART, SPI-with-handshake, or mailbox
//! driver; nothing in dispatch depends on which one.

use core::convert::Infallible;
use core::fmt;

/// Non-blocking byte pipe to the host.
pub trait Transport {
    type Error: fmt::Debug;

    /// Copy pending bytes into `buf`.  Returns 0 when nothing is pending.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Queue bytes for sending.  May accept fewer than `data.len()`.
    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error>;

    /// Push queued bytes onto the wire.
    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    /// True if `read` would return data.
    fn available(&self) -> bool;

    /// Write a whole frame, retrying short writes.
    fn write_all(&mut self, mut data: &[u8]) -> Result<(), WriteError<Self::Error>> {
        while !data.is_empty() {
            match self.write(data).map_err(WriteError::Link)? {
                0 => return Err(WriteError::Stalled { remaining: data.len() }),
                n => data = &data[n.min(data.len())..],
            }
        }
        Ok(())
    }
}

/// Failure of [`Transport::write_all`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteError<E> {
    /// The driver reported an error.
    Link(E),
    /// The driver accepted no bytes; the frame is cut short.
    Stalled { remaining: usize },
}

impl<E: fmt::Debug> fmt::Display for WriteError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Link(e) => write!(f, "link error: {e:?}"),
            Self::Stalled { remaining } => write!(f, "link stalled with {remaining} bytes unsent"),
        }
    }
}

/// No host attached: reads nothing, swallows writes.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTransport;

impl Transport for NullTransport {
    type Error = Infallible;

    fn read(&mut self, _buf: &mut [u8]) -> Result<usize, Infallible> {
        Ok(0)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, Infallible> {
        Ok(data.len())
    }

    fn available(&self) -> bool {
        false
    }
}
