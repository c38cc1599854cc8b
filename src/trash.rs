use std::fmt;
use std::path::PathBuf;

use crate::error::{OperationFailure, SyncError};
use crate::prompt::{ask_yes_no, Prompt};
use crate::propagate::ProgressCallback;
use crate::side::{Side, SidePair};

/// Something displaced into a trash during this session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrashItem {
    pub side: Side,
    pub nickname: String,
    /// Relative to the side's root, and to its trash.
    pub path: PathBuf,
}

impl fmt::Display for TrashItem {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}] {}", self.nickname, self.path.display())
    }
}

/// Everything both sides trashed this session, side A first.
pub fn trash_report(sides: &SidePair) -> Vec<TrashItem> {
    let mut items = Vec::new();
    for &side in &[Side::A, Side::B] {
        let state = sides.get(side);
        items.extend(state.trashed().iter().map(|path| TrashItem {
            side,
            nickname: state.nickname().to_owned(),
            path: path.clone(),
        }));
    }
    items
}

/// Lists the trash and asks once whether both trashes should be purged now.
/// Returns whether they were. Nothing is asked when both are empty.
///
/// Purge failures are recorded in `failures`; the trashes then simply stay
/// until the next session clears them.
pub fn finalize_trash<Q, P>(
    sides: &mut SidePair,
    items: &[TrashItem],
    prompt: &mut Q,
    progress: &P,
    failures: &mut Vec<OperationFailure>,
) -> Result<bool, SyncError>
where
    Q: Prompt + ?Sized,
    P: ProgressCallback,
{
    let mut any_content = false;
    for &side in &[Side::A, Side::B] {
        let state = sides.get(side);
        match state.trash_is_empty() {
            Ok(empty) => any_content |= !empty,
            Err(e) => {
                warn!("Could not list trash of {}: {}", state.nickname(), e);
                failures.push(OperationFailure {
                    path: state.trash_root().to_path_buf(),
                    error: e,
                });
            }
        }
    }
    if items.is_empty() && !any_content {
        debug!("Both trashes are empty");
        return Ok(false);
    }

    let mut question = String::from("The following were moved to the trash:\n");
    for item in items {
        info!("Trashed {}", item);
        question.push_str(&format!("  {}\n", item));
    }
    question.push_str("Purge both trashes now? (y/n)");

    if !ask_yes_no(prompt, &question)? {
        info!(
            "Keeping trash in {:?} and {:?} until the next sync",
            sides.a.trash_root(),
            sides.b.trash_root()
        );
        return Ok(false);
    }

    let mut purged = true;
    for &side in &[Side::A, Side::B] {
        let state = sides.get_mut(side);
        if let Err(e) = state.purge_trash(progress) {
            warn!("Could not purge trash of {}: {}", state.nickname(), e);
            failures.push(OperationFailure {
                path: state.trash_root().to_path_buf(),
                error: e,
            });
            purged = false;
        }
    }
    Ok(purged)
}
