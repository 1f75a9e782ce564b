use std::ffi::OsString;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use drbdwatch_api::Delta;
use signal_hook::consts::TERM_SIGNALS;
use signal_hook::flag;
use tracing::{debug, info, trace};
use typed_builder::TypedBuilder;

use crate::action::CommandAction;
use crate::dispatch::Dispatcher;
use crate::status::ProcDrbd;
use crate::WatchResult;

/// Some parameters of runtime operation
#[derive(TypedBuilder, Debug, Clone)]
pub struct Parameters {
    /// DRBD status file
    #[builder(default = PathBuf::from(ProcDrbd::DEFAULT_PATH))]
    pub status_path: PathBuf,

    /// Configured mounts
    #[builder(default = PathBuf::from(Parameters::DEFAULT_FSTAB_PATH))]
    pub fstab_path: PathBuf,

    /// Currently active mounts
    #[builder(default = PathBuf::from(Parameters::DEFAULT_PROC_MOUNTS_PATH))]
    pub proc_mounts_path: PathBuf,

    /// Time to sleep between reads of `status_path`
    #[builder(default = Parameters::DEFAULT_POLL_INTERVAL)]
    pub poll_interval: Duration,

    /// Only log command and mount lookup failures, instead of stopping
    #[builder(default)]
    pub ignore_errors: bool,

    /// Command (and its arguments) to execute on each change
    pub command: Vec<OsString>,
}

impl Parameters {
    pub const DEFAULT_FSTAB_PATH: &'static str = "/etc/fstab";
    pub const DEFAULT_PROC_MOUNTS_PATH: &'static str = "/proc/mounts";
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
}

pub struct WatcherCtrl {
    is_shutting_down: Arc<AtomicBool>,
}

impl WatcherCtrl {
    /// Make the watcher return after its current poll
    ///
    /// Commands already running are not waited for.
    pub fn stop(&self) {
        self.is_shutting_down.store(true, Ordering::SeqCst);
    }

    pub fn install_signal_handler(&self) -> io::Result<()> {
        debug!("Installing signal handler");
        for sig in TERM_SIGNALS {
            trace!(sig, "Installing signal handler");
            flag::register(*sig, Arc::clone(&self.is_shutting_down))?;
        }
        Ok(())
    }
}

/// Runs the configured command on every DRBD resource state change
pub struct Watcher {
    params: Parameters,
    action: CommandAction,
    is_shutting_down: Arc<AtomicBool>,
}

impl Watcher {
    pub fn new(params: Parameters) -> WatchResult<Self> {
        let action = CommandAction::new(&params)?;

        Ok(Self {
            params,
            action,
            is_shutting_down: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn get_ctrl(&self) -> WatcherCtrl {
        WatcherCtrl {
            is_shutting_down: Arc::clone(&self.is_shutting_down),
        }
    }

    /// Watch until the first fatal error, or until stopped
    pub fn run(self) -> WatchResult<()> {
        info!(
            status = %self.params.status_path.display(),
            fstab = %self.params.fstab_path.display(),
            poll_interval = ?self.params.poll_interval,
            ignore_errors = self.params.ignore_errors,
            "Starting drbdwatchd"
        );

        let action = self.action;
        let dispatcher = Dispatcher::new(
            move |delta: &Delta| action.invoke(delta),
            self.is_shutting_down,
        );

        let res = dispatcher.start(
            Arc::new(ProcDrbd::new(self.params.status_path)),
            self.params.poll_interval,
        );
        info!(ok = res.is_ok(), "Watcher finished");
        res
    }
}
