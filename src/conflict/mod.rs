pub mod resolve;

pub use crate::conflict::resolve::{resolve_conflicts, Resolution, ResolutionResult};

use std::path::{Path, PathBuf};

use crate::error::SyncError;
use crate::side::{Side, SidePair};
use crate::state::modified_millis;
use crate::util::format_millis;

#[derive(Debug, Clone, PartialEq, Eq)]
/// A file modified on both sides since the last sync.
pub struct Conflict {
    pub path: PathBuf,
    pub modified_a: i64,
    pub modified_b: i64,
}

impl Conflict {
    /// Reads the current modification times of `path` on both sides.
    pub fn read(sides: &SidePair, path: &Path) -> Result<Self, SyncError> {
        Ok(Conflict {
            path: path.to_path_buf(),
            modified_a: modified_millis(&sides.a.resolve(path))?,
            modified_b: modified_millis(&sides.b.resolve(path))?,
        })
    }

    pub fn modified(&self, side: Side) -> i64 {
        match side {
            Side::A => self.modified_a,
            Side::B => self.modified_b,
        }
    }

    /// The text shown to the operator when asking which version wins.
    pub fn question(&self, sides: &SidePair) -> String {
        let mut question = format!("Conflict at {:?}:\n", self.path);
        for &side in &[Side::A, Side::B] {
            let state = sides.get(side);
            question.push_str(&format!(
                "  {} ({}) {:?} modified {} ({} ms)\n",
                side,
                state.nickname(),
                state.resolve(&self.path),
                format_millis(self.modified(side)),
                self.modified(side)
            ));
        }
        question.push_str(&format!(
            "Keep which version? (a/{}, b/{})",
            sides.a.nickname(),
            sides.b.nickname()
        ));
        question
    }
}
