/// State of a single DRBD resource as reported by the kernel
///
/// The empty (`Default`) state stands for a resource that does
/// not exist: either it was not there yet, or it was torn down.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct State {
    /// Connection state (`cs:`), e.g. `WFConnection`, `SyncSource`
    pub connection: String,
    /// Our own role (`ro:` before the slash)
    pub self_role: String,
    /// Peer's role (`ro:` after the slash)
    pub remote_role: String,
    /// Our own disk state (`ds:` before the slash)
    pub self_disk: String,
    /// Peer's disk state (`ds:` after the slash)
    pub remote_disk: String,
}

impl State {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Describe what changed between `prior` and `self`
    ///
    /// Roles and disks are reported in pairs (`self/remote`), since
    /// that's how they show up in `/proc/drbd`.
    pub fn diff_summary(&self, prior: &State) -> String {
        let mut changes = vec![];

        let mut check = |name: &str, prior: String, current: String| {
            if prior != current {
                changes.push(format!("{name}:{prior}->{current}"));
            }
        };

        check(
            "Connection",
            prior.connection.clone(),
            self.connection.clone(),
        );
        check(
            "Role",
            format!("{}/{}", prior.self_role, prior.remote_role),
            format!("{}/{}", self.self_role, self.remote_role),
        );
        check(
            "Disk",
            format!("{}/{}", prior.self_disk, prior.remote_disk),
            format!("{}/{}", self.self_disk, self.remote_disk),
        );

        if changes.is_empty() {
            "no changes".into()
        } else {
            changes.join("; ")
        }
    }
}
