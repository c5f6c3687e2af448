//! Subsystems: registrable units owning two command tables.
//!
//! A [`Subsystem`] is a cheap, cloneable handle.  Lifecycle flags and the
//! async-stop counter are atomics behind it, so a stop hook can hand a clone
//! to a timer or callback that completes the stop later from another
//! context.
//!
//! ```text
//!              start()                    stop()
//!   stopped ───────────▶ started ─────────────────▶ stopping
//!      ▲                    │                          │ async stops == 0
//!      │     deinit()       │                          ▼
//!      └────────────────────┴─────────────────────── ready
//! ```
//!
//! At most one of started / stopping / ready is set at a time.

use core::fmt;
use core::sync::atomic::{AtomicU8, AtomicU16, Ordering};
use std::sync::Arc;

use log::{info, warn};

use crate::config::DEVICE_TYPE_MASK;

use super::table::CommandModule;

// ---------------------------------------------------------------------------
// Flags
// ---------------------------------------------------------------------------

/// Lifecycle flag bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SubsystemFlag {
    /// Appended to a registry.  Sticky.
    Registered = 0b0000_0001,
    /// Started; the started table is active.
    Started = 0b0000_0010,
    /// Stop called, asynchronous stops still pending.
    StoppingOngoing = 0b0000_0100,
    /// Every stop operation has completed.
    StoppingReady = 0b0000_1000,
}

impl SubsystemFlag {
    pub const fn mask(self) -> u8 {
        self as u8
    }
}

/// Flags that are mutually exclusive.
pub(crate) const RUN_STATE_MASK: u8 = SubsystemFlag::Started.mask()
    | SubsystemFlag::StoppingOngoing.mask()
    | SubsystemFlag::StoppingReady.mask();

// ---------------------------------------------------------------------------
// Subsystem
// ---------------------------------------------------------------------------

/// Table of modules, in init order.
pub type ModuleTable = &'static [&'static CommandModule];

struct Inner {
    device_type: u8,
    name: &'static str,
    started_table: ModuleTable,
    stopped_table: ModuleTable,
    flags: AtomicU8,
    async_stops: AtomicU16,
}

/// Handle to one subsystem.  Clones share state.
#[derive(Clone)]
pub struct Subsystem {
    inner: Arc<Inner>,
}

impl Subsystem {
    /// Create a stopped, unregistered subsystem.
    ///
    /// # Panics
    /// If `device_type` uses bits outside the header's device type field.
    pub fn new(
        device_type: u8,
        name: &'static str,
        started_table: ModuleTable,
        stopped_table: ModuleTable,
    ) -> Self {
        assert!(
            device_type & !DEVICE_TYPE_MASK == 0,
            "{name}: device type 0x{device_type:02x} uses bits outside the header field"
        );
        Self {
            inner: Arc::new(Inner {
                device_type,
                name,
                started_table,
                stopped_table,
                flags: AtomicU8::new(0),
                async_stops: AtomicU16::new(0),
            }),
        }
    }

    pub fn device_type(&self) -> u8 {
        self.inner.device_type
    }

    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    /// Modules consulted while started.
    pub fn started_table(&self) -> ModuleTable {
        self.inner.started_table
    }

    /// Modules consulted while not started.
    pub fn stopped_table(&self) -> ModuleTable {
        self.inner.stopped_table
    }

    /// The table lookup currently searches.
    pub fn active_table(&self) -> ModuleTable {
        if self.is_started() {
            self.inner.started_table
        } else {
            self.inner.stopped_table
        }
    }

    /// First module of the active table with a matching class id.
    pub fn find_module(&self, class_id: u8) -> Option<&'static CommandModule> {
        self.active_table()
            .iter()
            .copied()
            .find(|m| m.class_id == class_id)
    }

    /// True if both handles refer to the same subsystem.
    pub fn same(&self, other: &Subsystem) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // ── Flags ─────────────────────────────────────────────────

    pub fn flags(&self) -> u8 {
        self.inner.flags.load(Ordering::Acquire)
    }

    pub fn has_flag(&self, flag: SubsystemFlag) -> bool {
        self.flags() & flag.mask() != 0
    }

    /// Clear `clear` and set `set` in one atomic step.
    pub(crate) fn update_flags(&self, clear: u8, set: u8) {
        let _ = self
            .inner
            .flags
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |f| Some((f & !clear) | set));
    }

    pub fn is_registered(&self) -> bool {
        self.has_flag(SubsystemFlag::Registered)
    }

    pub fn is_started(&self) -> bool {
        self.has_flag(SubsystemFlag::Started)
    }

    /// Not started and not stopping.
    pub fn is_stopped(&self) -> bool {
        self.flags() & RUN_STATE_MASK == 0
    }

    pub fn has_finished_stopping(&self) -> bool {
        self.has_flag(SubsystemFlag::StoppingReady)
    }

    // ── Async stop completion ─────────────────────────────────

    /// Outstanding asynchronous stop operations (including the stop loop's
    /// own reference while it runs).
    pub fn pending_async_stops(&self) -> u16 {
        self.inner.async_stops.load(Ordering::Acquire)
    }

    /// Register an asynchronous stop operation.  Call before starting the
    /// work; pair with [`stop_finished`](Self::stop_finished).
    ///
    /// # Panics
    /// If the counter would overflow.
    pub fn stop_ongoing(&self) {
        let res = self
            .inner
            .async_stops
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_add(1));
        assert!(res.is_ok(), "{}: async stop counter overflow", self.inner.name);
    }

    /// Complete one asynchronous stop operation.  The last completion moves
    /// the subsystem to "finished stopping".
    pub fn stop_finished(&self) {
        match self
            .inner
            .async_stops
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
        {
            Ok(1) => {
                let ongoing = SubsystemFlag::StoppingOngoing.mask();
                let ready = SubsystemFlag::StoppingReady.mask();
                // Only a stop still in progress becomes ready; a restart or
                // deinit in between wins.
                let res = self.inner.flags.fetch_update(Ordering::AcqRel, Ordering::Acquire, |f| {
                    (f & ongoing != 0).then_some((f & !ongoing) | ready)
                });
                match res {
                    Ok(_) => info!("{}: stopped", self.inner.name),
                    Err(f) => warn!(
                        "{}: late stop completion ignored (flags {f:#06b})",
                        self.inner.name
                    ),
                }
            }
            Ok(_) => {}
            Err(_) => {
                warn!("{}: stop_finished without matching stop_ongoing", self.inner.name);
            }
        }
    }

    pub(crate) fn set_async_stops(&self, value: u16) {
        self.inner.async_stops.store(value, Ordering::Release);
    }

    /// Seed the counter for a stop sequence.  Fails if it is not zero.
    pub(crate) fn seed_async_stops(&self) -> Result<(), u16> {
        self.inner
            .async_stops
            .compare_exchange(0, 1, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
    }
}

impl fmt::Debug for Subsystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subsystem")
            .field("name", &self.inner.name)
            .field("device_type", &format_args!("0x{:02x}", self.inner.device_type))
            .field("flags", &format_args!("{:#06b}", self.flags()))
            .field("async_stops", &self.pending_async_stops())
            .finish()
    }
}
