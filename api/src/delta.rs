use std::time::Duration;

use crate::{ResourceId, State};

/// A detected state change of one resource (change event)
///
/// `unchanged_for` is the length of the poll cycle that caught the
/// change, not the real time since the previous transition. Polling
/// can't tell when exactly between two reads the change happened.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Delta {
    pub resource: ResourceId,
    pub old: State,
    pub new: State,
    pub unchanged_for: Duration,
}

impl Delta {
    /// Fold a `later` delta of the same resource into this one
    ///
    /// The result goes from our `old` straight to the `later` one's
    /// `new`, skipping whatever was in between.
    #[must_use]
    pub fn merge(self, later: Delta) -> Self {
        debug_assert_eq!(self.resource, later.resource);
        Self {
            resource: self.resource,
            old: self.old,
            new: later.new,
            unchanged_for: later.unchanged_for,
        }
    }
}

#[test]
fn merge_keeps_first_old() {
    let state = |c: &str| State {
        connection: c.into(),
        ..State::default()
    };
    let first = Delta {
        resource: ResourceId(0),
        old: state("A"),
        new: state("B"),
        unchanged_for: Duration::from_secs(5),
    };
    let second = Delta {
        resource: ResourceId(0),
        old: state("B"),
        new: state("C"),
        unchanged_for: Duration::from_millis(10),
    };

    let merged = first.merge(second);
    assert_eq!(merged.old, state("A"));
    assert_eq!(merged.new, state("C"));
    assert_eq!(merged.unchanged_for, Duration::from_millis(10));
}
