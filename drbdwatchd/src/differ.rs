use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use drbdwatch_api::{Changes, Snapshot, State};
use tracing::trace;

use crate::status::{SnapshotSource, StatusResult};

/// Compare two snapshots
///
/// Returns exactly the resources whose state differs. A resource
/// missing on either side counts as being in the empty [`State`].
pub fn compare(prior: &Snapshot, next: &Snapshot) -> Changes {
    let mut changes = Changes::default();

    for (id, old) in prior.iter() {
        match next.get(id) {
            Some(new) if new == old => {}
            Some(new) => changes.record(*id, old.clone(), new.clone()),
            // resource was torn down
            None => changes.record(*id, old.clone(), State::default()),
        }
    }

    for (id, new) in next.iter() {
        if !prior.contains_key(id) {
            changes.record(*id, State::default(), new.clone());
        }
    }

    changes
}

/// Block until the state of any resource differs from `prior`
///
/// Every `nap` a fresh snapshot is read from `source`. When nothing
/// changed, the fresh snapshot becomes the new baseline for the next
/// attempt. Read errors are returned immediately.
///
/// Returns `Ok(None)` if `is_shutting_down` got set in the meantime.
pub fn wait_for_changes(
    source: &dyn SnapshotSource,
    prior: &Snapshot,
    nap: Duration,
    is_shutting_down: &AtomicBool,
) -> StatusResult<Option<Changes>> {
    let mut prior = prior.clone();
    loop {
        if is_shutting_down.load(Ordering::SeqCst) {
            return Ok(None);
        }

        let next = source.read_snapshot()?;
        let changes = compare(&prior, &next);
        if !changes.is_empty() {
            return Ok(Some(changes));
        }

        trace!(resources = next.len(), "No changes");
        prior = next;
        thread::sleep(nap);
    }
}
