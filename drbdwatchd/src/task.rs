use std::io;
use std::thread::{self, JoinHandle};

use tracing::warn;

use crate::{WatchError, WatchResult};

/// Thread handle that joins the thread when dropped
pub struct AutoJoinHandle {
    join_handle: Option<JoinHandle<()>>,
}

impl AutoJoinHandle {
    pub fn spawn<F>(name: impl Into<String>, f: F) -> io::Result<Self>
    where
        F: FnOnce() + Send + 'static,
    {
        Ok(Self::from(thread::Builder::new().name(name.into()).spawn(f)?))
    }
}

impl From<JoinHandle<()>> for AutoJoinHandle {
    fn from(value: JoinHandle<()>) -> Self {
        Self {
            join_handle: Some(value),
        }
    }
}

impl Drop for AutoJoinHandle {
    fn drop(&mut self) {
        if let Some(join_handle) = self.join_handle.take() {
            let name = join_handle.thread().name().unwrap_or("unnamed").to_owned();
            if join_handle.join().is_err() {
                // already reported by its `PanicGuard`
                warn!(thread = %name, "Joined a panicked thread");
            }
        }
    }
}

/// Reports a panic of the task it's guarding as a fatal error
///
/// Call [`PanicGuard::done`] when the task finished normally.
pub struct PanicGuard {
    name: String,
    errors_tx: flume::Sender<WatchResult<()>>,
    done: bool,
}

impl PanicGuard {
    pub fn new(name: impl Into<String>, errors_tx: flume::Sender<WatchResult<()>>) -> Self {
        Self {
            name: name.into(),
            errors_tx,
            done: false,
        }
    }

    pub fn done(mut self) {
        self.done = true;
    }
}

impl Drop for PanicGuard {
    fn drop(&mut self) {
        if !self.done {
            warn!("Task {} panic detected via PanicGuard", self.name);
            let _ = self.errors_tx.try_send(Err(WatchError::Panicked {
                task: self.name.clone(),
            }));
        }
    }
}
