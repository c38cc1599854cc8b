use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::error::{OperationFailure, SyncError};
use crate::exclude::ExclusionSet;
use crate::propagate::ProgressCallback;
use crate::reconcile::{self, Operation};
use crate::side::{Side, SidePair};
use crate::state::{created_millis, modified_millis, EntryState};

mod util;
pub use crate::detect::util::{check_all_roots_exist, check_roots_disjoint};
use crate::detect::util::union_of_children;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
/// Counts of what a reconciliation pass did.
pub struct ReconcileStatistics {
    /// Entries copied onto the other side (a copied directory counts once).
    pub copied: usize,
    /// Entries moved into a trash because they were deleted on the other side.
    pub trashed: usize,
    pub conflicts: usize,
    /// Excluded entries that were pruned.
    pub skipped: usize,
    /// File pairs that needed no action.
    pub unchanged: usize,
}

/// The result of reconciling two trees.
#[derive(Debug)]
pub struct DetectionResult {
    /// Relative paths modified on both sides, sorted.
    pub conflicts: BTreeSet<PathBuf>,
    pub failures: Vec<OperationFailure>,
    pub statistics: ReconcileStatistics,
}

/// Walks both trees in lockstep, applying every non-conflicting action on
/// the way and collecting the paths that need a human decision.
///
/// Only a structural mismatch stops the walk. Other failures are recorded
/// against their path and the walk moves on to the next sibling.
pub struct Reconciler<'a, P: ProgressCallback> {
    sides: &'a mut SidePair,
    exclusions: &'a ExclusionSet,
    last_sync: i64,
    progress: &'a P,
    failures: Vec<OperationFailure>,
    statistics: ReconcileStatistics,
}

impl<'a, P: ProgressCallback> Reconciler<'a, P> {
    pub fn new(sides: &'a mut SidePair, exclusions: &'a ExclusionSet, progress: &'a P) -> Self {
        let last_sync = sides.last_sync_millis();
        Reconciler {
            sides,
            exclusions,
            last_sync,
            progress,
            failures: Vec::new(),
            statistics: ReconcileStatistics::default(),
        }
    }

    /// The "modified since" threshold in use.
    pub fn last_sync_millis(&self) -> i64 {
        self.last_sync
    }

    /// Reconciles `relative_path` and everything below it, returning the conflicts found.
    pub fn reconcile(&mut self, relative_path: &Path) -> Result<BTreeSet<PathBuf>, SyncError> {
        if relative_path.is_absolute() {
            return Err(SyncError::AbsolutePathProvided(relative_path.to_path_buf()));
        }

        match self.reconcile_entry(relative_path) {
            Ok(conflicts) => Ok(conflicts),
            Err(e) => {
                if e.is_fatal() {
                    return Err(e);
                }
                warn!("Skipping {:?}: {}", relative_path, e);
                self.failures.push(OperationFailure {
                    path: relative_path.to_path_buf(),
                    error: e,
                });
                Ok(BTreeSet::new())
            }
        }
    }

    /// Hands back what was collected.
    pub fn finish(self, conflicts: BTreeSet<PathBuf>) -> DetectionResult {
        DetectionResult {
            conflicts,
            failures: self.failures,
            statistics: self.statistics,
        }
    }

    fn reconcile_entry(&mut self, relative_path: &Path) -> Result<BTreeSet<PathBuf>, SyncError> {
        let path_a = self.sides.a.resolve(relative_path);
        let path_b = self.sides.b.resolve(relative_path);
        let state_a = EntryState::read(&path_a)?;
        let state_b = EntryState::read(&path_b)?;
        trace!("{:?}: {:?} / {:?}", relative_path, state_a, state_b);

        let operation = match (state_a, state_b) {
            (EntryState::Empty, EntryState::Empty) => Operation::Nothing,
            (EntryState::Directory, EntryState::Directory) => Operation::Recurse,
            (EntryState::File, EntryState::File) => {
                reconcile::for_files(modified_millis(&path_a)?, modified_millis(&path_b)?, self.last_sync)
            }
            (EntryState::Empty, _) => reconcile::for_orphan(Side::B, created_millis(&path_b)?, self.last_sync),
            (_, EntryState::Empty) => reconcile::for_orphan(Side::A, created_millis(&path_a)?, self.last_sync),
            _ => return Err(SyncError::StructuralMismatch { a: path_a, b: path_b }),
        };
        if operation != Operation::Recurse {
            debug!("{:?}: {:?}", relative_path, operation);
        }

        match operation {
            Operation::Nothing => {
                if state_a.entry_exists() {
                    self.statistics.unchanged += 1;
                }
            }
            Operation::Recurse => return self.reconcile_children(relative_path),
            Operation::Conflict => {
                info!("Conflict at {:?}", relative_path);
                self.statistics.conflicts += 1;
                let mut conflict = BTreeSet::new();
                conflict.insert(relative_path.to_path_buf());
                return Ok(conflict);
            }
            Operation::PropagateTo(target) => {
                let (target_side, source_side) = self.sides.split_mut(target);
                target_side.copy_from_other(relative_path, source_side.root(), self.exclusions, self.progress)?;
                self.statistics.copied += 1;
            }
            Operation::DeleteFrom(side) => {
                self.sides.get_mut(side).trash(relative_path, self.exclusions, self.progress)?;
                self.statistics.trashed += 1;
            }
        }
        Ok(BTreeSet::new())
    }

    fn reconcile_children(&mut self, relative_path: &Path) -> Result<BTreeSet<PathBuf>, SyncError> {
        trace!("Reading dir {:?}", relative_path);
        let names = union_of_children(
            &self.sides.a.resolve(relative_path),
            &self.sides.b.resolve(relative_path),
        )?;

        let mut conflicts = BTreeSet::new();
        for name in names {
            let child = relative_path.join(&name);
            if self.exclusions.is_excluded(&child) {
                self.progress.skipped(&child);
                self.statistics.skipped += 1;
                continue;
            }
            conflicts.extend(self.reconcile(&child)?);
        }
        Ok(conflicts)
    }
}

/// Reconciles both roots from the top, using the union of the exclusions.
pub fn reconcile_roots<P>(sides: &mut SidePair, exclusions: &ExclusionSet, progress: &P) -> Result<DetectionResult, SyncError>
where
    P: ProgressCallback,
{
    let mut reconciler = Reconciler::new(sides, exclusions, progress);
    info!(
        "Reconciling with last sync at {} ms",
        reconciler.last_sync_millis()
    );
    let conflicts = reconciler.reconcile(Path::new(""))?;
    Ok(reconciler.finish(conflicts))
}
