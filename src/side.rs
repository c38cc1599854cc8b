use std::cmp;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::archive::{self, SyncLog};
use crate::config::{SyncInfo, EXCLUDE_FILE_NAME, LOG_FILE_NAME, TRASH_DIR_NAME};
use crate::error::{DescribeIoError, SyncError};
use crate::exclude::ExclusionSet;
use crate::propagate::{copy_tree, move_tree, remove_tree, remove_tree_except, ProgressCallback};
use crate::util::format_millis;

/// Identifies one of the two sides of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn other(self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Side::A => write!(f, "A"),
            Side::B => write!(f, "B"),
        }
    }
}

/// Everything one root knows about itself and its partner during a session.
///
/// Constructing a `SideState` empties the trash left over from the previous
/// session. Nothing is persisted until `commit`.
#[derive(Debug)]
pub struct SideState {
    root: PathBuf,
    nickname: String,
    partner_nickname: String,
    last_sync_millis: i64,
    exclusions: ExclusionSet,
    trash_root: PathBuf,
    log: SyncLog,
    trashed: Vec<PathBuf>,
}

impl SideState {
    pub fn load(root: &Path, nickname: &str, partner_nickname: &str) -> Result<Self, SyncError> {
        let log = SyncLog::read(&root.join(LOG_FILE_NAME))?;
        let last_sync_millis = log.last_sync(partner_nickname);

        let exclusions = archive::read_exclusions(&root.join(EXCLUDE_FILE_NAME))?.union(&ExclusionSet::reserved());

        let trash_root = root.join(TRASH_DIR_NAME);
        match fs::symlink_metadata(&trash_root) {
            Ok(metadata) => {
                debug!("Clearing trash {:?} left by the previous session", trash_root);
                let cleared = if metadata.is_dir() {
                    fs::remove_dir_all(&trash_root)
                } else {
                    fs::remove_file(&trash_root)
                };
                cleared.describe(|| format!("could not clear trash {:?}", trash_root))?;
            }
            Err(ref e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e).describe(|| format!("could not inspect trash {:?}", trash_root)),
        }
        fs::create_dir(&trash_root).describe(|| format!("could not create trash {:?}", trash_root))?;

        info!(
            "Loaded {} at {:?} (last sync with {}: {})",
            nickname,
            root,
            partner_nickname,
            if last_sync_millis == 0 {
                "never".to_owned()
            } else {
                format_millis(last_sync_millis)
            }
        );

        Ok(SideState {
            root: root.to_path_buf(),
            nickname: nickname.to_owned(),
            partner_nickname: partner_nickname.to_owned(),
            last_sync_millis,
            exclusions,
            trash_root,
            log,
            trashed: Vec::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    pub fn partner_nickname(&self) -> &str {
        &self.partner_nickname
    }

    /// When this side last completed a sync with its partner, 0 if never.
    pub fn last_sync_millis(&self) -> i64 {
        self.last_sync_millis
    }

    /// This side's persisted exclusions, including the reserved entries.
    pub fn exclusions(&self) -> &ExclusionSet {
        &self.exclusions
    }

    pub fn trash_root(&self) -> &Path {
        &self.trash_root
    }

    /// Relative paths moved into the trash during this session, in order.
    pub fn trashed(&self) -> &[PathBuf] {
        &self.trashed
    }

    pub fn resolve(&self, relative_path: &Path) -> PathBuf {
        self.root.join(relative_path)
    }

    /// Moves whatever exists at `relative_path` into the trash, keeping its
    /// relative location. Returns false if there was nothing to move.
    pub fn trash<P>(&mut self, relative_path: &Path, exclusions: &ExclusionSet, progress: &P) -> Result<bool, SyncError>
    where
        P: ProgressCallback,
    {
        Ok(self.trash_entry(relative_path, exclusions, progress)?.is_some())
    }

    /// Like `trash`, but hands back where the entry ended up.
    fn trash_entry<P>(
        &mut self,
        relative_path: &Path,
        exclusions: &ExclusionSet,
        progress: &P,
    ) -> Result<Option<PathBuf>, SyncError>
    where
        P: ProgressCallback,
    {
        if relative_path.is_absolute() || relative_path.as_os_str().is_empty() {
            return Err(SyncError::AbsolutePathProvided(relative_path.to_path_buf()));
        }

        let source = self.resolve(relative_path);
        match fs::symlink_metadata(&source) {
            Ok(_) => {}
            Err(ref e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(SyncError::Metadata { path: source, error }),
        }

        let destination = vacant_destination(self.trash_root.join(relative_path));
        info!("Trashing {:?} on {}", relative_path, self.nickname);
        move_tree(&source, &destination, relative_path, exclusions, progress)?;
        self.trashed.push(relative_path.to_path_buf());
        Ok(Some(destination))
    }

    /// Replaces whatever is at `relative_path` with the entry at the same
    /// relative path under `other_root`. The old content goes to the trash first.
    ///
    /// If the copy fails, the partial copy is removed and the old content is
    /// moved back, so the path looks untouched to the next session.
    pub fn copy_from_other<P>(
        &mut self,
        relative_path: &Path,
        other_root: &Path,
        exclusions: &ExclusionSet,
        progress: &P,
    ) -> Result<(), SyncError>
    where
        P: ProgressCallback,
    {
        let trashed_to = self.trash_entry(relative_path, exclusions, progress)?;

        let source = other_root.join(relative_path);
        let destination = self.resolve(relative_path);
        info!("Copying {:?} to {}", relative_path, self.nickname);
        let error = match copy_tree(&source, &destination, relative_path, exclusions, progress) {
            Ok(()) => return Ok(()),
            Err(error) => error,
        };

        if let Err(e) = self.restore(relative_path, trashed_to, exclusions, progress) {
            warn!("Could not restore {:?} on {} after a failed copy: {}", relative_path, self.nickname, e);
        }
        Err(error)
    }

    /// Undoes a `copy_from_other` whose copy failed half way.
    fn restore<P>(
        &mut self,
        relative_path: &Path,
        trashed_to: Option<PathBuf>,
        exclusions: &ExclusionSet,
        progress: &P,
    ) -> Result<(), SyncError>
    where
        P: ProgressCallback,
    {
        let destination = self.resolve(relative_path);
        if fs::symlink_metadata(&destination).is_ok() {
            remove_tree_except(&destination, relative_path, exclusions, progress)?;
        }
        if let Some(trashed_to) = trashed_to {
            move_tree(&trashed_to, &destination, relative_path, exclusions, progress)?;
            if let Some(index) = self.trashed.iter().rposition(|path| path == relative_path) {
                self.trashed.remove(index);
            }
            debug!("Restored {:?} on {} from the trash", relative_path, self.nickname);
        }
        Ok(())
    }

    /// Persists the shared exclusions and the new completion time for this
    /// side's partner. The recorded time never moves backwards.
    pub fn commit(&mut self, exclusions: &ExclusionSet, new_timestamp_millis: i64) -> Result<(), SyncError> {
        archive::write_exclusions(&self.root.join(EXCLUDE_FILE_NAME), exclusions)?;
        self.exclusions = exclusions.clone();

        let millis = cmp::max(new_timestamp_millis, self.last_sync_millis);
        self.log.record(&self.partner_nickname, millis);
        self.log.write(&self.root.join(LOG_FILE_NAME))?;
        self.last_sync_millis = millis;
        debug!("{} now last synced with {} at {}", self.nickname, self.partner_nickname, millis);
        Ok(())
    }

    pub fn trash_is_empty(&self) -> Result<bool, SyncError> {
        let mut entries = fs::read_dir(&self.trash_root).map_err(|error| SyncError::Metadata {
            path: self.trash_root.clone(),
            error,
        })?;
        Ok(entries.next().is_none())
    }

    /// Deletes everything in the trash for good and recreates it empty.
    pub fn purge_trash<P>(&mut self, progress: &P) -> Result<(), SyncError>
    where
        P: ProgressCallback,
    {
        if self.trash_root.exists() {
            remove_tree(&self.trash_root, progress)?;
        }
        let trash_root = &self.trash_root;
        fs::create_dir(trash_root).describe(|| format!("could not recreate trash {:?}", trash_root))?;
        info!("Purged trash of {}", self.nickname);
        self.trashed.clear();
        Ok(())
    }
}

/// `path` itself if nothing is there yet, otherwise the first free `<name>.<n>` sibling.
fn vacant_destination(path: PathBuf) -> PathBuf {
    if fs::symlink_metadata(&path).is_err() {
        return path;
    }
    let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    let mut n = 1;
    loop {
        let candidate = path.with_file_name(format!("{}.{}", name, n));
        if fs::symlink_metadata(&candidate).is_err() {
            warn!("{:?} is already in the trash, using {:?}", path, candidate);
            return candidate;
        }
        n += 1;
    }
}

/// The two sides of one session.
#[derive(Debug)]
pub struct SidePair {
    pub a: SideState,
    pub b: SideState,
}

impl SidePair {
    /// Loads both sides. Each side's log is keyed by the other's nickname.
    pub fn load(config: &SyncInfo) -> Result<Self, SyncError> {
        let a = SideState::load(&config.a.root, &config.a.nickname, &config.b.nickname)?;
        let b = SideState::load(&config.b.root, &config.b.nickname, &config.a.nickname)?;
        Ok(SidePair { a, b })
    }

    pub fn get(&self, side: Side) -> &SideState {
        match side {
            Side::A => &self.a,
            Side::B => &self.b,
        }
    }

    pub fn get_mut(&mut self, side: Side) -> &mut SideState {
        match side {
            Side::A => &mut self.a,
            Side::B => &mut self.b,
        }
    }

    /// Borrows `target` mutably alongside its partner.
    pub fn split_mut(&mut self, target: Side) -> (&mut SideState, &SideState) {
        match target {
            Side::A => (&mut self.a, &self.b),
            Side::B => (&mut self.b, &self.a),
        }
    }

    /// The union both sides agree on for this session.
    pub fn merged_exclusions(&self) -> ExclusionSet {
        self.a.exclusions.union(&self.b.exclusions)
    }

    /// The threshold for "modified since the last sync" for this pairing.
    pub fn last_sync_millis(&self) -> i64 {
        cmp::max(self.a.last_sync_millis, self.b.last_sync_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::propagate::EmptyProgressCallback;
    use tempfile::TempDir;

    #[test]
    fn load_clears_previous_trash() {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join(".sync_trash/old")).unwrap();
        fs::write(root.path().join(".sync_trash/old/file"), "stale").unwrap();

        let side = SideState::load(root.path(), "here", "there").unwrap();
        assert!(side.trash_is_empty().unwrap());
        assert!(root.path().join(".sync_exclude").is_file());
        assert_eq!(side.last_sync_millis(), 0);
    }

    #[test]
    fn trash_is_a_no_op_for_missing_paths() {
        let root = TempDir::new().unwrap();
        let mut side = SideState::load(root.path(), "here", "there").unwrap();
        let moved = side
            .trash(Path::new("nope/missing"), &ExclusionSet::reserved(), &EmptyProgressCallback)
            .unwrap();
        assert!(!moved);
        assert!(side.trashed().is_empty());
    }

    #[test]
    fn trashing_twice_keeps_both_copies() {
        let root = TempDir::new().unwrap();
        let mut side = SideState::load(root.path(), "here", "there").unwrap();
        let exclusions = ExclusionSet::reserved();

        fs::write(root.path().join("f"), "first").unwrap();
        assert!(side.trash(Path::new("f"), &exclusions, &EmptyProgressCallback).unwrap());
        fs::write(root.path().join("f"), "second").unwrap();
        assert!(side.trash(Path::new("f"), &exclusions, &EmptyProgressCallback).unwrap());

        assert_eq!(fs::read_to_string(root.path().join(".sync_trash/f")).unwrap(), "first");
        assert_eq!(fs::read_to_string(root.path().join(".sync_trash/f.1")).unwrap(), "second");
        assert_eq!(side.trashed().len(), 2);
    }

    #[test]
    fn commit_never_moves_the_timestamp_backwards() {
        let root = TempDir::new().unwrap();
        fs::write(root.path().join(".sync_log"), "there,5000\nother,7\n").unwrap();
        let mut side = SideState::load(root.path(), "here", "There").unwrap();
        assert_eq!(side.last_sync_millis(), 5000);

        side.commit(&ExclusionSet::reserved(), 10).unwrap();
        assert_eq!(side.last_sync_millis(), 5000);
        assert_eq!(
            fs::read_to_string(root.path().join(".sync_log")).unwrap(),
            "other,7\nThere,5000\n"
        );
    }

    #[test]
    fn failed_copy_puts_the_old_entry_back() {
        let root = TempDir::new().unwrap();
        let other = TempDir::new().unwrap();
        let mut side = SideState::load(root.path(), "here", "there").unwrap();
        fs::write(root.path().join("f"), "stale").unwrap();

        // nothing to copy from on the other side
        let result = side.copy_from_other(
            Path::new("f"),
            other.path(),
            &ExclusionSet::reserved(),
            &EmptyProgressCallback,
        );

        assert!(result.is_err());
        assert_eq!(fs::read_to_string(root.path().join("f")).unwrap(), "stale");
        assert!(side.trashed().is_empty());
        assert!(side.trash_is_empty().unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn failed_directory_copy_removes_the_partial_copy() {
        use std::os::unix::net::UnixListener;

        let root = TempDir::new().unwrap();
        let other = TempDir::new().unwrap();
        let mut side = SideState::load(root.path(), "here", "there").unwrap();
        fs::create_dir_all(root.path().join("dir/cache")).unwrap();
        fs::write(root.path().join("dir/old.txt"), "old").unwrap();
        fs::write(root.path().join("dir/cache/blob"), "local").unwrap();
        fs::create_dir(other.path().join("dir")).unwrap();
        fs::write(other.path().join("dir/a.txt"), "new").unwrap();
        let _socket = UnixListener::bind(other.path().join("dir/z.sock")).unwrap();

        let exclusions = ExclusionSet::reserved().union(&vec!["cache"].into_iter().collect());
        let result = side.copy_from_other(Path::new("dir"), other.path(), &exclusions, &EmptyProgressCallback);

        assert!(result.is_err());
        assert!(!root.path().join("dir/a.txt").exists());
        assert!(!root.path().join("dir/z.sock").exists());
        assert_eq!(fs::read_to_string(root.path().join("dir/old.txt")).unwrap(), "old");
        assert_eq!(fs::read_to_string(root.path().join("dir/cache/blob")).unwrap(), "local");
        assert!(side.trashed().is_empty());
    }
}
