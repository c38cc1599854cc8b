use std::fs;
use std::io;
use std::path::Path;

use crate::error::{SyncError, TimestampKind};
use crate::util::epoch_millis;

/// Mirrors the kind of entry found at a path on the filesystem.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryState {
    Empty,
    File,
    Directory,
}

impl EntryState {
    /// Reads the state of an absolute path. Symlinks are followed, so a
    /// link to a directory is treated as that directory.
    pub fn read(path: &Path) -> Result<EntryState, SyncError> {
        match fs::metadata(path) {
            Ok(metadata) => {
                if metadata.is_dir() {
                    Ok(EntryState::Directory)
                } else {
                    Ok(EntryState::File)
                }
            }
            Err(ref e) if e.kind() == io::ErrorKind::NotFound => Ok(EntryState::Empty),
            Err(error) => Err(SyncError::Metadata {
                path: path.to_path_buf(),
                error,
            }),
        }
    }

    /// Returns true if the entry is present (ie: it is not empty)
    pub fn entry_exists(&self) -> bool {
        *self != EntryState::Empty
    }
}

/// Modification time of `path` in epoch millis.
pub fn modified_millis(path: &Path) -> Result<i64, SyncError> {
    read_timestamp(path, TimestampKind::Modified)
}

/// Creation (birth) time of `path` in epoch millis.
///
/// Filesystems that do not record birth times produce
/// `SyncError::TimestampUnavailable` rather than a substitute value.
pub fn created_millis(path: &Path) -> Result<i64, SyncError> {
    read_timestamp(path, TimestampKind::Created)
}

fn read_timestamp(path: &Path, kind: TimestampKind) -> Result<i64, SyncError> {
    let unavailable = |error| SyncError::TimestampUnavailable {
        path: path.to_path_buf(),
        kind,
        error,
    };
    let metadata = fs::metadata(path).map_err(unavailable)?;
    let time = match kind {
        TimestampKind::Created => metadata.created(),
        TimestampKind::Modified => metadata.modified(),
    };
    time.map(epoch_millis).map_err(unavailable)
}
