//! Start / stop / deinit transitions.
//!
//! Init runs in table order; stop and deinit run in exact reverse, so a
//! module is never torn down after the modules it depends on.
//!
//! Stop completion is reference counted.  The stop sequence holds one
//! reference for its own loop; each stop hook that starts asynchronous work
//! takes another with [`Subsystem::stop_ongoing`].  The subsystem reports
//! "finished stopping" only when the loop has released its reference and
//! every hook has called [`Subsystem::stop_finished`].

use log::{info, warn};

use crate::error::Result;

use super::registry::Registry;
use super::subsystem::{RUN_STATE_MASK, Subsystem, SubsystemFlag};

impl Registry {
    /// Start a subsystem, registering it first if needed.
    ///
    /// On the first failing `init`, every module initialised before it is
    /// deinitialised in reverse order, the subsystem is left not started and
    /// the failure is returned.
    pub fn start(&mut self, subsystem: &Subsystem) -> Result<()> {
        if !subsystem.is_registered() {
            self.register(subsystem);
        }

        subsystem.update_flags(RUN_STATE_MASK, SubsystemFlag::Started.mask());

        let table = subsystem.started_table();
        for (idx, module) in table.iter().enumerate() {
            let Some(init) = module.init else { continue };
            if let Err(e) = init(subsystem) {
                warn!(
                    "{}: init of '{}' failed: {e}, rolling back {idx} module(s)",
                    subsystem.name(),
                    module.name
                );
                for done in table[..idx].iter().rev() {
                    if let Some(deinit) = done.deinit {
                        deinit(subsystem);
                    }
                }
                subsystem.update_flags(SubsystemFlag::Started.mask(), 0);
                return Err(e);
            }
        }

        info!("{}: started ({} modules)", subsystem.name(), table.len());
        Ok(())
    }
}

impl Subsystem {
    /// Begin stopping.  Stop hooks run in reverse table order; the
    /// subsystem finishes stopping once the loop and every asynchronous
    /// stop registered during it have completed.
    ///
    /// # Panics
    /// If a previous stop is still pending.
    pub fn stop(&self) {
        if let Err(pending) = self.seed_async_stops() {
            panic!("{}: stop called with {pending} async stop(s) pending", self.name());
        }

        self.update_flags(
            SubsystemFlag::Started.mask() | SubsystemFlag::StoppingReady.mask(),
            SubsystemFlag::StoppingOngoing.mask(),
        );
        info!("{}: stopping", self.name());

        for module in self.started_table().iter().rev() {
            if let Some(stop) = module.stop {
                stop(self);
            }
        }

        self.stop_finished();
    }

    /// Forced teardown: deinit every started-table module in reverse order
    /// regardless of state, then reset the counter and run-state flags.
    /// Registration is kept.
    pub fn deinit(&self) {
        for module in self.started_table().iter().rev() {
            if let Some(deinit) = module.deinit {
                deinit(self);
            }
        }
        self.set_async_stops(0);
        self.update_flags(RUN_STATE_MASK, 0);
        info!("{}: deinitialised", self.name());
    }
}
