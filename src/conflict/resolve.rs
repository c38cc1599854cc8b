use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::conflict::Conflict;
use crate::error::{OperationFailure, SyncError};
use crate::exclude::ExclusionSet;
use crate::prompt::{ask_until, Prompt};
use crate::propagate::ProgressCallback;
use crate::side::{Side, SidePair};

/// The operator's decision for one conflict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub path: PathBuf,
    pub winner: Side,
}

#[derive(Debug, Default)]
pub struct ResolutionResult {
    pub resolutions: Vec<Resolution>,
    pub failures: Vec<OperationFailure>,
}

/// Interprets an answer as a side: `a`, `b`, or either nickname, ignoring case.
pub fn parse_side(answer: &str, nickname_a: &str, nickname_b: &str) -> Option<Side> {
    let answer = answer.to_lowercase();
    if answer == "a" {
        Some(Side::A)
    } else if answer == "b" {
        Some(Side::B)
    } else if answer == nickname_a.to_lowercase() {
        Some(Side::A)
    } else if answer == nickname_b.to_lowercase() {
        Some(Side::B)
    } else {
        None
    }
}

/// Asks which side's version of `conflict` should be kept.
pub fn choose_winner<Q: Prompt + ?Sized>(sides: &SidePair, conflict: &Conflict, prompt: &mut Q) -> Result<Side, SyncError> {
    let question = conflict.question(sides);
    ask_until(prompt, &question, |answer| {
        parse_side(answer, sides.a.nickname(), sides.b.nickname())
    })
}

/// Asks about every conflict in path order and overwrites the losing side
/// with the winning one. The losing version ends up in its side's trash.
///
/// A conflict whose timestamps can no longer be read, or whose copy fails,
/// is recorded as a failure. Only a prompt that stops answering is fatal.
pub fn resolve_conflicts<Q, P>(
    sides: &mut SidePair,
    conflicts: &BTreeSet<PathBuf>,
    exclusions: &ExclusionSet,
    prompt: &mut Q,
    progress: &P,
) -> Result<ResolutionResult, SyncError>
where
    Q: Prompt + ?Sized,
    P: ProgressCallback,
{
    let mut result = ResolutionResult::default();

    for path in conflicts {
        let conflict = match Conflict::read(sides, path) {
            Ok(conflict) => conflict,
            Err(e) => {
                warn!("Cannot present conflict {:?}: {}", path, e);
                result.failures.push(OperationFailure { path: path.clone(), error: e });
                continue;
            }
        };

        let winner = choose_winner(sides, &conflict, prompt)?;
        info!(
            "Resolving {:?} in favour of {}",
            path,
            sides.get(winner).nickname()
        );

        let (loser_side, winner_side) = sides.split_mut(winner.other());
        match loser_side.copy_from_other(path, winner_side.root(), exclusions, progress) {
            Ok(()) => result.resolutions.push(Resolution { path: path.clone(), winner }),
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!("Could not resolve {:?}: {}", path, e);
                result.failures.push(OperationFailure { path: path.clone(), error: e });
            }
        }
    }

    Ok(result)
}
