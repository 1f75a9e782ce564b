use std::collections::BTreeMap;
use std::ops;

use crate::{ResourceId, State};

/// States of all resources at one point in time
///
/// Built fresh on every read of the status file and never
/// modified afterwards by the reader.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Snapshot {
    inner: BTreeMap<ResourceId, State>,
}

impl ops::Deref for Snapshot {
    type Target = BTreeMap<ResourceId, State>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl ops::DerefMut for Snapshot {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

impl FromIterator<(ResourceId, State)> for Snapshot {
    fn from_iter<T: IntoIterator<Item = (ResourceId, State)>>(iter: T) -> Self {
        Self {
            inner: BTreeMap::from_iter(iter),
        }
    }
}

impl Snapshot {
    /// State of `resource`, or the empty state if it's not there
    pub fn state_of(&self, resource: ResourceId) -> State {
        self.inner.get(&resource).cloned().unwrap_or_default()
    }
}

/// A single detected `old -> new` change
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transition {
    pub old: State,
    pub new: State,
}

/// All the resources that changed between two snapshots
///
/// Appearing and disappearing resources are represented as
/// transitions from and to the empty [`State`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Changes {
    inner: BTreeMap<ResourceId, Transition>,
}

impl ops::Deref for Changes {
    type Target = BTreeMap<ResourceId, Transition>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl ops::DerefMut for Changes {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

impl IntoIterator for Changes {
    type Item = (ResourceId, Transition);
    type IntoIter = std::collections::btree_map::IntoIter<ResourceId, Transition>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

impl Changes {
    pub fn record(&mut self, resource: ResourceId, old: State, new: State) {
        self.inner.insert(resource, Transition { old, new });
    }

    /// Old states of all changed resources
    pub fn olds(&self) -> Snapshot {
        self.inner
            .iter()
            .map(|(id, t)| (*id, t.old.clone()))
            .collect()
    }

    /// New states of all changed resources
    pub fn news(&self) -> Snapshot {
        self.inner
            .iter()
            .map(|(id, t)| (*id, t.new.clone()))
            .collect()
    }
}

#[test]
fn changes_views() {
    let up = State {
        connection: "Connected".into(),
        ..State::default()
    };
    let mut changes = Changes::default();
    changes.record(ResourceId(0), State::default(), up.clone());
    changes.record(ResourceId(1), up.clone(), State::default());

    assert_eq!(changes.olds().state_of(ResourceId(0)), State::default());
    assert_eq!(changes.olds().state_of(ResourceId(1)), up);
    assert_eq!(changes.news().state_of(ResourceId(0)), up);
    assert!(changes.news()[&ResourceId(1)].is_empty());
    assert_eq!(changes.len(), 2);
}
