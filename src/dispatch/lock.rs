//! Single-command-in-flight lock.
//!
//! The command builder acquires the lock in `begin_*` and releases it in
//! `end_command`.  Acquisition never blocks: a second `begin_*` while a
//! command is in flight fails with [`Error::LockUnavailable`].

use core::sync::atomic::{AtomicBool, Ordering};

use crate::error::{Error, Result};

/// Mutual exclusion primitive supplied by the platform.
pub trait CommandLock {
    /// Take the lock, or fail at once if it is already held.
    fn acquire(&self) -> Result<()>;

    /// Release a lock taken with [`acquire`](Self::acquire).
    fn release(&self);

    /// True while the lock is held.
    fn is_held(&self) -> bool;
}

/// Default lock: one atomic flag.
#[derive(Debug, Default)]
pub struct FlagLock {
    held: AtomicBool,
}

impl FlagLock {
    pub const fn new() -> Self {
        Self {
            held: AtomicBool::new(false),
        }
    }
}

impl CommandLock for FlagLock {
    fn acquire(&self) -> Result<()> {
        self.held
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .map(|_| ())
            .map_err(|_| Error::LockUnavailable)
    }

    fn release(&self) {
        self.held.store(false, Ordering::Release);
    }

    fn is_held(&self) -> bool {
        self.held.load(Ordering::Acquire)
    }
}
