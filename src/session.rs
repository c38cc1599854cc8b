use std::cmp;
use std::path::PathBuf;

use crate::config::{SideInfo, SyncInfo};
use crate::conflict::{resolve_conflicts, Resolution};
use crate::detect::{check_all_roots_exist, check_roots_disjoint, reconcile_roots, ReconcileStatistics};
use crate::error::{OperationFailure, SyncError};
use crate::prompt::Prompt;
use crate::propagate::ProgressCallback;
use crate::side::SidePair;
use crate::trash::{finalize_trash, trash_report, TrashItem};
use crate::util::now_millis;

/// What one completed session did.
#[derive(Debug)]
pub struct SessionReport {
    /// Conflicts found, in the order they were presented.
    pub conflicts: Vec<PathBuf>,
    pub resolutions: Vec<Resolution>,
    /// Everything displaced into either trash during the session.
    pub trashed: Vec<TrashItem>,
    pub purged: bool,
    /// Per-path failures. The session carried on past each of them.
    pub failures: Vec<OperationFailure>,
    pub statistics: ReconcileStatistics,
    /// The completion time written to both logs.
    pub last_sync_millis: i64,
}

impl SessionReport {
    /// True if every path was handled.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

fn check_nicknames(a: &SideInfo, b: &SideInfo) -> Result<(), SyncError> {
    for side in &[a, b] {
        let nickname = &side.nickname;
        if nickname.trim().is_empty() || nickname.contains(',') || nickname.contains('\n') || nickname.contains('\r') {
            return Err(SyncError::InvalidNickname(nickname.clone()));
        }
    }
    if a.nickname.trim().to_lowercase() == b.nickname.trim().to_lowercase() {
        return Err(SyncError::SameNickname(a.nickname.clone()));
    }
    Ok(())
}

/// Runs one synchronization session between the two roots in `config`.
///
/// Loads both sides (clearing their trash), reconciles the trees, asks
/// `prompt` about each conflict and about purging the trash, then persists
/// the shared exclusions and the new last-sync time on both sides.
///
/// Any error returned from here is fatal and was raised before anything was
/// persisted, so the last-sync time never advances past an aborted run.
/// Per-path failures do not stop the new time being recorded. A failed copy
/// leaves its destination as it was, so the path is judged again next run.
///
/// The completion time is taken once conflicts are resolved, before the
/// purge question. Entries created on either side after that instant count
/// as new next time.
///
/// There is no locking: two sessions running against the same roots at
/// the same time will corrupt each other's bookkeeping. Callers have to
/// serialize sessions themselves.
pub fn synchronize<Q, P>(config: &SyncInfo, prompt: &mut Q, progress: &P) -> Result<SessionReport, SyncError>
where
    Q: Prompt + ?Sized,
    P: ProgressCallback,
{
    check_all_roots_exist([config.a.root.as_path(), config.b.root.as_path()].iter().copied())?;
    check_roots_disjoint(&config.a.root, &config.b.root)?;
    check_nicknames(&config.a, &config.b)?;

    let mut sides = SidePair::load(config)?;
    let exclusions = sides.merged_exclusions();
    debug!("Merged exclusions: {:?}", exclusions.sorted());

    let detection = reconcile_roots(&mut sides, &exclusions, progress)?;
    let mut failures = detection.failures;
    info!("{} conflicts", detection.conflicts.len());

    let resolution = resolve_conflicts(&mut sides, &detection.conflicts, &exclusions, prompt, progress)?;
    failures.extend(resolution.failures);

    // taken before the purge question, which may block for a long time
    let completed_at = cmp::max(now_millis(), sides.last_sync_millis());

    let trashed = trash_report(&sides);
    let purged = finalize_trash(&mut sides, &trashed, prompt, progress, &mut failures)?;

    sides.a.commit(&exclusions, completed_at)?;
    sides.b.commit(&exclusions, completed_at)?;
    let last_sync_millis = sides.last_sync_millis();

    for failure in &failures {
        warn!("Failed: {}", failure);
    }

    Ok(SessionReport {
        conflicts: detection.conflicts.into_iter().collect(),
        resolutions: resolution.resolutions,
        trashed,
        purged,
        failures,
        statistics: detection.statistics,
        last_sync_millis,
    })
}
