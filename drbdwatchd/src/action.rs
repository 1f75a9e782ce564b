//! Running the user command for a [`Delta`]
//!
//! The command is executed as:
//!
//! ```text
//! command [args...] r0 WFConnection Secondary Unknown UpToDate DUnknown /my/file/system
//! ```
//!
//! where the trailing arguments are the resource name, the new state
//! (connection, own role, peer role, own disk, peer disk) and the first
//! mount point configured for the resource in fstab (or an empty string).
//!
//! Additionally the following environment variables are set:
//!
//! * `OLD_CONNECTED_STATE`, `OLD_SELF_ROLE`, `OLD_REMOTE_ROLE`,
//!   `OLD_SELF_DISK`, `OLD_REMOTE_DISK` - the prior state,
//! * `RESOURCE` - the resource name (`r0`),
//! * `ALL_MOUNTS` - space separated mount points of the resource, both
//!   configured and currently mounted,
//! * `STABLE_SECONDS` - for how long the prior state was observed
//!   (whole seconds).
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use drbdwatch_api::Delta;
use thiserror::Error;
use tracing::{debug, warn};

use crate::mounts::{mount_points, MountError};
use crate::{Parameters, WatchError, WatchResult};

#[derive(Error, Debug)]
pub enum ActionError {
    #[error("mount point lookup failed")]
    Mounts(#[from] MountError),
    #[error("can not execute {program}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("{program} failed: {status}")]
    Failed { program: String, status: ExitStatus },
}

pub type ActionResult<T> = std::result::Result<T, ActionError>;

#[derive(Debug, Clone)]
pub struct CommandAction {
    program: OsString,
    args: Vec<OsString>,
    fstab_path: PathBuf,
    proc_mounts_path: PathBuf,
    ignore_errors: bool,
}

impl CommandAction {
    pub fn new(params: &Parameters) -> WatchResult<Self> {
        let (program, args) = params.command.split_first().ok_or(WatchError::NoCommand)?;

        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            fstab_path: params.fstab_path.clone(),
            proc_mounts_path: params.proc_mounts_path.clone(),
            ignore_errors: params.ignore_errors,
        })
    }

    /// Run the command for `delta` and wait for it to finish
    ///
    /// With `ignore_errors` all failures are only logged.
    pub fn invoke(&self, delta: &Delta) -> ActionResult<()> {
        let configured = self.configured_mounts(delta)?;
        let mounted = self.live_mounts(delta);

        let mut cmd = self.command(delta, &configured, &mounted);
        debug!(resource = %delta.resource.name(), cmd = ?cmd, "Executing");

        let program = self.program.to_string_lossy().into_owned();
        let res = match cmd.status() {
            Ok(status) if status.success() => Ok(()),
            Ok(status) => Err(ActionError::Failed { program, status }),
            Err(source) => Err(ActionError::Spawn { program, source }),
        };

        match res {
            Err(e) if self.ignore_errors => {
                warn!(resource = %delta.resource.name(), error = %e, "Command failed");
                Ok(())
            }
            res => res,
        }
    }

    /// Mount points configured in fstab
    ///
    /// A missing fstab just means nothing is configured. Other failures
    /// are fatal unless `ignore_errors` is set.
    fn configured_mounts(&self, delta: &Delta) -> ActionResult<Vec<PathBuf>> {
        let path = self.fstab_path.as_path();
        match mount_points(delta.resource, &[path]) {
            Ok(mounts) => Ok(mounts),
            Err(MountError::Io { ref source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No fstab, no configured mount points");
                Ok(vec![])
            }
            Err(e) if self.ignore_errors => {
                warn!(path = %path.display(), error = %e, "Could not read mount points");
                Ok(vec![])
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Currently mounted mount points, best effort
    fn live_mounts(&self, delta: &Delta) -> Vec<PathBuf> {
        let path = self.proc_mounts_path.as_path();
        mount_points(delta.resource, &[path]).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "Could not read mount points");
            vec![]
        })
    }

    /// Build the command for `delta`
    ///
    /// `configured` must be sorted; its first entry is passed as the mount
    /// point argument.
    fn command(&self, delta: &Delta, configured: &[PathBuf], mounted: &[PathBuf]) -> Command {
        let mut all_mounts: Vec<_> = configured.iter().chain(mounted).collect();
        all_mounts.sort();
        all_mounts.dedup();
        let all_mounts = all_mounts
            .iter()
            .map(|p| p.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ");

        let new = &delta.new;
        let old = &delta.old;

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg(delta.resource.name())
            .args([
                &new.connection,
                &new.self_role,
                &new.remote_role,
                &new.self_disk,
                &new.remote_disk,
            ])
            .arg(configured.first().map(|p| p.as_os_str()).unwrap_or_default())
            .env("OLD_CONNECTED_STATE", &old.connection)
            .env("OLD_SELF_ROLE", &old.self_role)
            .env("OLD_REMOTE_ROLE", &old.remote_role)
            .env("OLD_SELF_DISK", &old.self_disk)
            .env("OLD_REMOTE_DISK", &old.remote_disk)
            .env("RESOURCE", delta.resource.name())
            .env("ALL_MOUNTS", all_mounts)
            .env("STABLE_SECONDS", delta.unchanged_for.as_secs().to_string());
        cmd
    }
}
