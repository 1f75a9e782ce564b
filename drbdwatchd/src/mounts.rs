use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};

use drbdwatch_api::ResourceId;
use thiserror::Error;
use tracing::trace;

#[derive(Error, Debug)]
pub enum MountError {
    #[error("can not read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed line {line_no} in {}", path.display())]
    Malformed { path: PathBuf, line_no: usize },
}

pub type MountResult<T> = std::result::Result<T, MountError>;

/// Find mount points of `resource`'s device in fstab-formatted `files`
///
/// Works both for `/etc/fstab` (configured, possibly not mounted) and
/// `/proc/mounts` (currently mounted). Results from all files are
/// deduplicated and sorted.
pub fn mount_points<P: AsRef<Path>>(
    resource: ResourceId,
    files: &[P],
) -> MountResult<Vec<PathBuf>> {
    let device = resource.device_path();
    let mut mount_points = BTreeSet::new();

    for path in files {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| MountError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        for (i, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut fields = line.split_whitespace();
            let (Some(spec), Some(file)) = (fields.next(), fields.next()) else {
                return Err(MountError::Malformed {
                    path: path.to_path_buf(),
                    line_no: i + 1,
                });
            };

            if spec == device {
                trace!(%device, mount_point = file, path = %path.display(), "Found mount point");
                mount_points.insert(PathBuf::from(unescape_octal(file)));
            }
        }
    }

    Ok(mount_points.into_iter().collect())
}

/// Decode `\040`-style escapes used for whitespace in fstab fields
fn unescape_octal(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(pos) = rest.find('\\') {
        out.push_str(&rest[..pos]);
        let escaped = &rest[pos + 1..];
        match escaped
            .get(..3)
            .filter(|digits| digits.bytes().all(|b| (b'0'..=b'7').contains(&b)))
            .and_then(|digits| u8::from_str_radix(digits, 8).ok())
        {
            Some(byte) => {
                out.push(char::from(byte));
                rest = &escaped[3..];
            }
            None => {
                out.push('\\');
                rest = escaped;
            }
        }
    }
    out.push_str(rest);
    out
}
