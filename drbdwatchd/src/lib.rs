#![deny(clippy::as_conversions)]

pub mod action;
pub mod differ;
pub mod dispatch;
pub mod mounts;
pub mod poll;
pub mod status;
mod task;
mod watcher;

#[cfg(test)]
mod testutil;

pub use drbdwatch_api as api;
pub use watcher::*;

mod error {
    use std::io;

    use thiserror::Error;

    use crate::action::ActionError;
    use crate::status::StatusError;

    #[derive(Error, Debug)]
    pub enum WatchError {
        #[error("status file error")]
        Status(#[from] StatusError),
        #[error("action failed")]
        Action(#[from] ActionError),
        #[error("task {task} panicked")]
        Panicked { task: String },
        #[error("a command is required")]
        NoCommand,
        #[error("io error")]
        Io(#[from] io::Error),
    }
}

pub use self::error::WatchError;
pub type WatchResult<T> = std::result::Result<T, WatchError>;
