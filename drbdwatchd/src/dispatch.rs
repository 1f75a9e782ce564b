//! Per-resource serialized dispatch of [`Delta`]s
//!
//! Every resource is in one of three states, tracked in a ledger:
//!
//! * idle (no entry) - nothing running,
//! * [`Slot::Running`] - a callback thread is working on this resource,
//! * [`Slot::Queued`] - a callback is running, and one more delta is
//!   waiting for it to finish.
//!
//! Deltas arriving for a queued resource are merged into the queued one
//! (see [`Delta::merge`]), so a flapping resource gets at most one callback
//! in flight plus one waiting, no matter how many changes were detected.
//! Different resources are handled fully in parallel.
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use drbdwatch_api::{Delta, ResourceId};
use tracing::{debug, info, trace};

use crate::action::ActionError;
use crate::poll::PollLoop;
use crate::status::SnapshotSource;
use crate::task::{AutoJoinHandle, PanicGuard};
use crate::{WatchError, WatchResult};

#[derive(Debug)]
enum Slot {
    Running,
    Queued(Delta),
}

pub struct Dispatcher<F> {
    callback: F,
    ledger: Mutex<HashMap<ResourceId, Slot>>,
    is_shutting_down: Arc<AtomicBool>,
    /// First error reported wins, the rest is dropped
    errors_tx: flume::Sender<WatchResult<()>>,
    errors_rx: flume::Receiver<WatchResult<()>>,
}

impl<F> Dispatcher<F>
where
    F: Fn(&Delta) -> Result<(), ActionError> + Send + Sync + 'static,
{
    pub fn new(callback: F, is_shutting_down: Arc<AtomicBool>) -> Arc<Self> {
        let (errors_tx, errors_rx) = flume::bounded(1);
        Arc::new(Self {
            callback,
            ledger: Mutex::new(HashMap::new()),
            is_shutting_down,
            errors_tx,
            errors_rx,
        })
    }

    /// Watch `source` and dispatch every change until a fatal error
    ///
    /// Blocks the caller. Returns the first error reported by the poll
    /// loop or any callback, or `Ok(())` once shutdown was requested.
    pub fn start(
        self: &Arc<Self>,
        source: Arc<dyn SnapshotSource>,
        nap: Duration,
    ) -> WatchResult<()> {
        let poll_thread = AutoJoinHandle::spawn("poll", {
            let this = Arc::clone(self);
            move || {
                let _guard = scopeguard::guard((), |_| {
                    info!("PollLoop is done");
                });
                let panic_guard = this.panic_guard("poll");
                let res = PollLoop::new(source.as_ref(), nap)
                    .run(&this.is_shutting_down, |delta| this.submit(delta));
                this.report(res.map_err(WatchError::from));
                panic_guard.done();
            }
        })?;

        // we hold a sender ourselves, so this can't disconnect
        let res = self.errors_rx.recv().unwrap_or(Ok(()));

        self.is_shutting_down.store(true, Ordering::SeqCst);
        drop(poll_thread);

        res
    }

    /// Hand over a delta, without waiting for its callback
    pub fn submit(self: &Arc<Self>, delta: Delta) {
        let mut ledger = self.ledger.lock().expect("locking failed");

        let to_run = match ledger.entry(delta.resource) {
            Entry::Occupied(mut entry) => {
                let slot = entry.get_mut();
                let queued = match std::mem::replace(slot, Slot::Running) {
                    Slot::Queued(queued) => {
                        trace!(resource = %delta.resource.name(), "Merging into queued delta");
                        queued.merge(delta)
                    }
                    Slot::Running => {
                        trace!(resource = %delta.resource.name(), "Queueing delta");
                        delta
                    }
                };
                *slot = Slot::Queued(queued);
                None
            }
            Entry::Vacant(entry) => {
                entry.insert(Slot::Running);
                Some(delta)
            }
        };
        drop(ledger);

        if let Some(delta) = to_run {
            self.spawn_callbacks(delta);
        }
    }

    fn spawn_callbacks(self: &Arc<Self>, delta: Delta) {
        let name = format!("action-{}", delta.resource.name());
        let this = Arc::clone(self);
        if let Err(e) = thread::Builder::new()
            .name(name.clone())
            .spawn(move || this.run_callbacks(name, delta))
        {
            self.report(Err(e.into()));
        }
    }

    /// Run the callback for `delta`, then for any delta queued for the same
    /// resource in the meantime, until there's nothing left
    fn run_callbacks(&self, name: String, mut delta: Delta) {
        let resource = delta.resource;
        let _guard = scopeguard::guard((), |_| {
            trace!(resource = %resource.name(), "Callback thread is done");
        });
        let panic_guard = self.panic_guard(name);

        loop {
            debug!(resource = %resource.name(), "Invoking action");
            if let Err(e) = (self.callback)(&delta) {
                self.report(Err(e.into()));
            }

            let mut ledger = self.ledger.lock().expect("locking failed");
            match ledger.remove(&resource) {
                Some(Slot::Queued(next)) => {
                    ledger.insert(resource, Slot::Running);
                    delta = next;
                }
                Some(Slot::Running) => break,
                None => {
                    debug_assert!(false, "running resource missing from the ledger");
                    break;
                }
            }
        }

        panic_guard.done();
    }

    fn report(&self, res: WatchResult<()>) {
        // full means someone was first already
        let _ = self.errors_tx.try_send(res);
    }

    fn panic_guard(&self, name: impl Into<String>) -> PanicGuard {
        PanicGuard::new(name, self.errors_tx.clone())
    }

    /// Is there no callback running nor queued
    #[cfg(test)]
    fn is_idle(&self) -> bool {
        self.ledger.lock().expect("locking failed").is_empty()
    }
}
