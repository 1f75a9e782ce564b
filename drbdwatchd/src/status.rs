//! Reading `/proc/drbd`
//!
//! Example content:
//!
//! ```text
//! version: 8.4.10 (api:1/proto:86-101)
//! srcversion: 15111D056BF899E7D986DDD
//!  0: cs:WFConnection ro:Secondary/Unknown ds:UpToDate/DUnknown C r-----
//!     ns:0 nr:0 dw:0 dr:0 al:0 bm:0 lo:0 pe:0 ua:0 ap:0 ep:1 wo:f oos:2649072
//! ```
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use drbdwatch_api::{ResourceId, Snapshot, State};
use regex::Regex;
use thiserror::Error;
use tracing::trace;

#[derive(Error, Debug)]
pub enum StatusError {
    #[error("can not read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{} did not start with a version string. Found: '{line}'", path.display())]
    MissingVersion { path: PathBuf, line: String },
    #[error("{} ended early", path.display())]
    EndedEarly { path: PathBuf },
    #[error("unexpected {} output line: {line}", path.display())]
    UnexpectedLine { path: PathBuf, line: String },
}

pub type StatusResult<T> = std::result::Result<T, StatusError>;

/// Something we can pull the current state of all resources from
pub trait SnapshotSource: Send + Sync {
    /// Read current states
    ///
    /// If DRBD is not running at all, this is an empty [`Snapshot`],
    /// not an error.
    fn read_snapshot(&self) -> StatusResult<Snapshot>;
}

/// `/proc/drbd` (or a file with the same format)
#[derive(Debug, Clone)]
pub struct ProcDrbd {
    path: PathBuf,
}

impl ProcDrbd {
    pub const DEFAULT_PATH: &'static str = "/proc/drbd";

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotSource for ProcDrbd {
    fn read_snapshot(&self) -> StatusResult<Snapshot> {
        let file = match std::fs::File::open(&self.path) {
            Ok(file) => file,
            // if DRBD isn't running, `/proc/drbd` won't exist
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                trace!(path = %self.path.display(), "Status file does not exist");
                return Ok(Snapshot::default());
            }
            Err(source) => {
                return Err(StatusError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        parse_status(&self.path, BufReader::new(file))
    }
}

fn resource_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^ *(\d+): cs:(\S+) ro:(\S+?)/(\S+) ds:(\S+?)/(\S+)(?:\s|$)")
            .expect("valid regex")
    })
}

fn skip_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s+(?:ns:\d+ |\[=*>\.*\] sync'ed|finish: \d)").expect("valid regex")
    })
}

/// Parse `/proc/drbd` formatted content
///
/// `path` is used only for error reporting.
pub fn parse_status(path: &Path, reader: impl BufRead) -> StatusResult<Snapshot> {
    let io_err = |source| StatusError::Io {
        path: path.to_owned(),
        source,
    };
    let mut lines = reader.lines();

    // An empty file means no resources configured
    let Some(version) = lines.next().transpose().map_err(io_err)? else {
        return Ok(Snapshot::default());
    };
    if !version.starts_with("version") {
        return Err(StatusError::MissingVersion {
            path: path.to_owned(),
            line: version,
        });
    }

    // skip over version checksum
    if lines.next().transpose().map_err(io_err)?.is_none() {
        return Err(StatusError::EndedEarly {
            path: path.to_owned(),
        });
    }

    let mut snapshot = Snapshot::default();
    for line in lines {
        let line = line.map_err(io_err)?;

        if let Some(caps) = resource_re().captures(&line) {
            let id = caps[1]
                .parse::<u32>()
                .map_err(|_| StatusError::UnexpectedLine {
                    path: path.to_owned(),
                    line: line.clone(),
                })?;
            snapshot.insert(
                ResourceId(id),
                State {
                    connection: caps[2].to_owned(),
                    self_role: caps[3].to_owned(),
                    remote_role: caps[4].to_owned(),
                    self_disk: caps[5].to_owned(),
                    remote_disk: caps[6].to_owned(),
                },
            );
            continue;
        }

        if line.trim().is_empty() || skip_re().is_match(&line) {
            continue;
        }

        return Err(StatusError::UnexpectedLine {
            path: path.to_owned(),
            line,
        });
    }

    Ok(snapshot)
}
