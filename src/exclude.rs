use std::iter::FromIterator;
use std::path::{Component, Path, PathBuf};

use crate::config::{EXCLUDE_FILE_NAME, LOG_FILE_NAME, TRASH_DIR_NAME};
use crate::util::FnvHashSet;

/// Relative paths that are never inspected, copied, moved or deleted.
///
/// An entry matches any relative path that ends with all of the entry's
/// components, so `build` excludes both `build` and `app/build`, while
/// `app/build` excludes `app/build` and `x/app/build` but not `build` or
/// `app/builder`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet {
    entries: FnvHashSet<PathBuf>,
}

impl ExclusionSet {
    /// An `ExclusionSet` that excludes nothing.
    pub fn nothing() -> Self {
        ExclusionSet::default()
    }

    /// The control files every side carries. They never propagate.
    pub fn reserved() -> Self {
        ExclusionSet::from_iter(vec![EXCLUDE_FILE_NAME, LOG_FILE_NAME, TRASH_DIR_NAME])
    }

    /// Adds an entry, dropping `.` components. Blank entries are ignored, and
    /// so are absolute ones or ones containing `..`.
    pub fn insert<P: AsRef<Path>>(&mut self, entry: P) -> bool {
        let entry = entry.as_ref();
        let mut normalized = PathBuf::new();
        for component in entry.components() {
            match component {
                Component::Normal(name) => normalized.push(name),
                Component::CurDir => {}
                _ => {
                    warn!("Ignoring exclusion entry {:?}, it must be a relative path below the root", entry);
                    return false;
                }
            }
        }
        if normalized.as_os_str().is_empty() {
            return false;
        }
        self.entries.insert(normalized)
    }

    /// Both sets merged. Exclusions are symmetric, so both sides persist the result.
    pub fn union(&self, other: &ExclusionSet) -> ExclusionSet {
        ExclusionSet {
            entries: self.entries.union(&other.entries).cloned().collect(),
        }
    }

    /// checks if the relative path is on the exclusion list
    pub fn is_excluded(&self, relative_path: &Path) -> bool {
        self.entries.iter().any(|entry| relative_path.ends_with(entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in lexicographic order, which is the order they are persisted in.
    pub fn sorted(&self) -> Vec<&Path> {
        let mut entries: Vec<&Path> = self.entries.iter().map(PathBuf::as_path).collect();
        entries.sort();
        entries
    }
}

impl<P: AsRef<Path>> FromIterator<P> for ExclusionSet {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        let mut set = ExclusionSet::nothing();
        for entry in iter {
            set.insert(entry);
        }
        set
    }
}
