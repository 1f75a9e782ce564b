use derive_more::{Display, From};

mod state;
pub use self::state::*;

mod snapshot;
pub use self::snapshot::*;

mod delta;
pub use self::delta::*;

/// DRBD resource (minor) number
///
/// Identifies one replicated block device (`/dev/drbd<N>`).
/// Stable across reads of the status file, but the set of
/// live resources can grow and shrink at any time.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Display, From)]
pub struct ResourceId(pub u32);

impl ResourceId {
    /// Conventional resource name, e.g. `r0`
    pub fn name(&self) -> String {
        format!("r{}", self.0)
    }

    /// Block device backing this resource, e.g. `/dev/drbd0`
    pub fn device_path(&self) -> String {
        format!("/dev/drbd{}", self.0)
    }
}

#[test]
fn resource_id_names() {
    let id = ResourceId(3);
    assert_eq!(id.to_string(), "3");
    assert_eq!(id.name(), "r3");
    assert_eq!(id.device_path(), "/dev/drbd3");
}
