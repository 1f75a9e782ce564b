use std::sync::atomic::AtomicBool;
use std::time::{Duration, Instant};

use drbdwatch_api::{Delta, Snapshot};
use tracing::{debug, info};

use crate::differ::wait_for_changes;
use crate::status::{SnapshotSource, StatusResult};

/// Detection loop turning snapshot changes into [`Delta`]s
///
/// Owns the running baseline. Starts from an empty one, so the first
/// read reports every existing resource as having just appeared.
pub struct PollLoop<'a> {
    source: &'a dyn SnapshotSource,
    nap: Duration,
    baseline: Snapshot,
}

impl<'a> PollLoop<'a> {
    pub fn new(source: &'a dyn SnapshotSource, nap: Duration) -> Self {
        Self {
            source,
            nap,
            baseline: Snapshot::default(),
        }
    }

    /// Run until a read error, or until `is_shutting_down` is set
    ///
    /// `on_change` must not block: it is called inline for every
    /// change, and a slow call would delay detection for all the
    /// other resources.
    pub fn run(
        mut self,
        is_shutting_down: &AtomicBool,
        mut on_change: impl FnMut(Delta),
    ) -> StatusResult<()> {
        loop {
            let start = Instant::now();
            let Some(changes) =
                wait_for_changes(self.source, &self.baseline, self.nap, is_shutting_down)?
            else {
                debug!("Poll loop stopping");
                return Ok(());
            };
            let unchanged_for = start.elapsed();

            for (resource, transition) in changes {
                info!(
                    resource = %resource.name(),
                    change = %transition.new.diff_summary(&transition.old),
                    "Resource changed state"
                );

                if transition.new.is_empty() {
                    self.baseline.remove(&resource);
                } else {
                    self.baseline.insert(resource, transition.new.clone());
                }

                on_change(Delta {
                    resource,
                    old: transition.old,
                    new: transition.new,
                    unchanged_for,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::sync::Mutex;

    use drbdwatch_api::ResourceId;

    use super::*;
    use crate::testutil::state;

    /// Flips between two snapshots, then stops the loop
    struct Flapping {
        reads: Mutex<usize>,
        snapshots: Vec<Snapshot>,
        stop_after: usize,
        is_shutting_down: AtomicBool,
    }

    impl SnapshotSource for Flapping {
        fn read_snapshot(&self) -> StatusResult<Snapshot> {
            let mut reads = self.reads.lock().expect("locking failed");
            *reads += 1;
            if *reads >= self.stop_after {
                self.is_shutting_down.store(true, Ordering::SeqCst);
            }
            Ok(self.snapshots[(*reads - 1) % self.snapshots.len()].clone())
        }
    }

    #[test]
    fn emits_appearance_and_disappearance() -> anyhow::Result<()> {
        let up: Snapshot = [(ResourceId(0), state("WFConnection"))]
            .into_iter()
            .collect();
        let source = Flapping {
            reads: Mutex::new(0),
            snapshots: vec![up, Snapshot::default()],
            stop_after: 4,
            is_shutting_down: AtomicBool::new(false),
        };

        let mut deltas = vec![];
        PollLoop::new(&source, Duration::from_millis(1))
            .run(&source.is_shutting_down, |delta| deltas.push(delta))?;

        let transitions: Vec<_> = deltas
            .iter()
            .map(|d| (d.resource, d.old.connection.as_str(), d.new.connection.as_str()))
            .collect();
        assert_eq!(
            transitions,
            vec![
                (ResourceId(0), "", "WFConnection"),
                (ResourceId(0), "WFConnection", ""),
                (ResourceId(0), "", "WFConnection"),
                (ResourceId(0), "WFConnection", ""),
            ]
        );
        Ok(())
    }
}
