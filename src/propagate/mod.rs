use std::ffi::OsString;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

use crate::error::SyncError;
use crate::exclude::ExclusionSet;

mod progress;
pub use crate::propagate::progress::{EmptyProgressCallback, LogProgressCallback, ProgressCallback};

/// Names of the immediate children of `directory`.
pub fn list_children(directory: &Path) -> Result<Vec<OsString>, SyncError> {
    let metadata_error = |error| SyncError::Metadata {
        path: directory.to_path_buf(),
        error,
    };
    let mut names = Vec::new();
    for entry in fs::read_dir(directory).map_err(metadata_error)? {
        names.push(entry.map_err(metadata_error)?.file_name());
    }
    Ok(names)
}

/// Copies the file or directory at `source` to `destination`.
///
/// `relative_path` is where `source` sits relative to its root; descendants
/// whose relative path is excluded are not copied.
pub fn copy_tree<P>(
    source: &Path,
    destination: &Path,
    relative_path: &Path,
    exclusions: &ExclusionSet,
    progress: &P,
) -> Result<(), SyncError>
where
    P: ProgressCallback,
{
    let metadata = fs::metadata(source).map_err(|error| SyncError::Metadata {
        path: source.to_path_buf(),
        error,
    })?;
    if !metadata.is_dir() {
        return copy_file(source, destination, progress);
    }

    let walker = WalkDir::new(source)
        .follow_links(true)
        .sort_by(|a, b| a.file_name().cmp(b.file_name()))
        .into_iter()
        .filter_entry(|entry| match entry.path().strip_prefix(source) {
            Ok(inner) if !inner.as_os_str().is_empty() => {
                let inner_relative = relative_path.join(inner);
                if exclusions.is_excluded(&inner_relative) {
                    progress.skipped(&inner_relative);
                    false
                } else {
                    true
                }
            }
            _ => true,
        });

    for entry in walker {
        let entry = entry?;
        let inner = match entry.path().strip_prefix(source) {
            Ok(inner) => inner,
            Err(_) => continue,
        };
        let target = destination.join(inner);
        if entry.file_type().is_dir() {
            trace!("Creating directory {:?}", target);
            fs::create_dir_all(&target).map_err(|error| SyncError::Copy {
                source: entry.path().to_path_buf(),
                destination: target.clone(),
                error,
            })?;
        } else {
            copy_file(entry.path(), &target, progress)?;
        }
    }

    Ok(())
}

fn copy_file<P>(source: &Path, destination: &Path, progress: &P) -> Result<(), SyncError>
where
    P: ProgressCallback,
{
    let copy_error = |error| SyncError::Copy {
        source: source.to_path_buf(),
        destination: destination.to_path_buf(),
        error,
    };
    if let Some(parent) = destination.parent() {
        if !parent.exists() {
            debug!("Creating parent directory {:?}", parent);
            fs::create_dir_all(parent).map_err(copy_error)?;
        }
    }
    fs::copy(source, destination).map_err(copy_error)?;
    progress.copied(source, destination);
    Ok(())
}

/// Relocates the file or directory at `source` to `destination`, creating
/// missing parents of `destination`.
///
/// Excluded descendants of a directory stay where they are, together with
/// the directories leading to them. Returns false if anything was left behind.
pub fn move_tree<P>(
    source: &Path,
    destination: &Path,
    relative_path: &Path,
    exclusions: &ExclusionSet,
    progress: &P,
) -> Result<bool, SyncError>
where
    P: ProgressCallback,
{
    let move_error = |error| SyncError::Move {
        source: source.to_path_buf(),
        destination: destination.to_path_buf(),
        error,
    };
    let metadata = fs::symlink_metadata(source).map_err(|error| SyncError::Metadata {
        path: source.to_path_buf(),
        error,
    })?;
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).map_err(move_error)?;
    }

    if !metadata.is_dir() {
        move_entry(source, destination, progress)?;
        return Ok(true);
    }

    if !contains_excluded(source, relative_path, exclusions)? {
        match fs::rename(source, destination) {
            Ok(()) => {
                progress.moved(source, destination);
                return Ok(true);
            }
            Err(e) => debug!(
                "Renaming {:?} to {:?} failed ({}), moving entries one by one",
                source, destination, e
            ),
        }
    }

    fs::create_dir_all(destination).map_err(move_error)?;
    let mut complete = true;
    let mut names = list_children(source)?;
    names.sort();
    for name in names {
        let child_relative = relative_path.join(&name);
        if exclusions.is_excluded(&child_relative) {
            progress.skipped(&child_relative);
            complete = false;
            continue;
        }
        complete &= move_tree(
            &source.join(&name),
            &destination.join(&name),
            &child_relative,
            exclusions,
            progress,
        )?;
    }

    if complete {
        fs::remove_dir(source).map_err(|error| SyncError::Remove {
            path: source.to_path_buf(),
            error,
        })?;
    }
    Ok(complete)
}

/// Moves a single non-directory entry, falling back to copy and remove when
/// a rename is impossible (eg: across filesystems).
fn move_entry<P>(source: &Path, destination: &Path, progress: &P) -> Result<(), SyncError>
where
    P: ProgressCallback,
{
    if let Err(rename_error) = fs::rename(source, destination) {
        debug!("Renaming {:?} failed ({}), copying instead", source, rename_error);
        if fs::copy(source, destination).is_err() {
            let _ = fs::remove_file(destination);
            return Err(SyncError::Move {
                source: source.to_path_buf(),
                destination: destination.to_path_buf(),
                error: rename_error,
            });
        }
        fs::remove_file(source).map_err(|error| SyncError::Remove {
            path: source.to_path_buf(),
            error,
        })?;
    }
    progress.moved(source, destination);
    Ok(())
}

/// Checks whether any descendant of `directory` is excluded.
fn contains_excluded(directory: &Path, relative_path: &Path, exclusions: &ExclusionSet) -> Result<bool, SyncError> {
    for entry in WalkDir::new(directory).min_depth(1) {
        let entry = entry?;
        if let Ok(inner) = entry.path().strip_prefix(directory) {
            if exclusions.is_excluded(&relative_path.join(inner)) {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

/// Deletes a file or directory permanently.
pub fn remove_tree<P>(path: &Path, progress: &P) -> Result<(), SyncError>
where
    P: ProgressCallback,
{
    let metadata = fs::symlink_metadata(path).map_err(|error| SyncError::Metadata {
        path: path.to_path_buf(),
        error,
    })?;
    let result = if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    result.map_err(|error| SyncError::Remove {
        path: path.to_path_buf(),
        error,
    })?;
    progress.removed(path);
    Ok(())
}

/// Deletes a file or directory permanently, sparing excluded descendants
/// and the directories leading to them. Returns false if anything was spared.
pub fn remove_tree_except<P>(
    path: &Path,
    relative_path: &Path,
    exclusions: &ExclusionSet,
    progress: &P,
) -> Result<bool, SyncError>
where
    P: ProgressCallback,
{
    let metadata = fs::symlink_metadata(path).map_err(|error| SyncError::Metadata {
        path: path.to_path_buf(),
        error,
    })?;
    if !metadata.is_dir() || !contains_excluded(path, relative_path, exclusions)? {
        remove_tree(path, progress)?;
        return Ok(true);
    }

    let mut complete = true;
    let mut names = list_children(path)?;
    names.sort();
    for name in names {
        let child_relative = relative_path.join(&name);
        if exclusions.is_excluded(&child_relative) {
            complete = false;
            continue;
        }
        complete &= remove_tree_except(&path.join(&name), &child_relative, exclusions, progress)?;
    }

    if complete {
        fs::remove_dir(path).map_err(|error| SyncError::Remove {
            path: path.to_path_buf(),
            error,
        })?;
    }
    Ok(complete)
}
