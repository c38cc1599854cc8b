use std::collections::BTreeSet;
use std::ffi::OsString;
use std::path::Path;

use crate::error::SyncError;
use crate::propagate::list_children;

/// Every root has to be an existing directory.
pub fn check_all_roots_exist<'a, I: Iterator<Item = &'a Path>>(roots: I) -> Result<(), SyncError> {
    for root in roots {
        if !root.is_dir() {
            return Err(SyncError::RootDoesntExist(root.to_path_buf()));
        }
    }
    Ok(())
}

/// Neither root may be inside the other, or a traversal would see both.
pub fn check_roots_disjoint(a: &Path, b: &Path) -> Result<(), SyncError> {
    let canonical_a = a.canonicalize().map_err(|_| SyncError::RootDoesntExist(a.to_path_buf()))?;
    let canonical_b = b.canonicalize().map_err(|_| SyncError::RootDoesntExist(b.to_path_buf()))?;
    if canonical_a.starts_with(&canonical_b) || canonical_b.starts_with(&canonical_a) {
        return Err(SyncError::OverlappingRoots(a.to_path_buf(), b.to_path_buf()));
    }
    Ok(())
}

/// The union of the immediate child names of two directories, sorted.
pub fn union_of_children(a: &Path, b: &Path) -> Result<BTreeSet<OsString>, SyncError> {
    let mut names = BTreeSet::new();
    names.extend(list_children(a)?);
    names.extend(list_children(b)?);
    Ok(names)
}
