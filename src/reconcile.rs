use crate::side::Side;

/// What reconciliation decided to do with one relative path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Both sides are consistent with the last sync point.
    Nothing,
    /// Copy the entry onto the given side, replacing what is there.
    PropagateTo(Side),
    /// The entry was deleted elsewhere, move it to the given side's trash.
    DeleteFrom(Side),
    /// Both sides hold a directory; reconcile the children instead.
    Recurse,
    /// Changed on both sides, a human has to decide.
    Conflict,
}

/// Decides between two files from their modification times.
///
/// A file counts as modified when its time is strictly after `last_sync`.
/// The unmodified side is the one that gets replaced.
pub fn for_files(modified_a: i64, modified_b: i64, last_sync: i64) -> Operation {
    let changed_a = modified_a > last_sync;
    let changed_b = modified_b > last_sync;
    match (changed_a, changed_b) {
        (true, true) => Operation::Conflict,
        (true, false) => Operation::PropagateTo(Side::B),
        (false, true) => Operation::PropagateTo(Side::A),
        (false, false) => Operation::Nothing,
    }
}

/// Decides the fate of an entry that only exists on `present`.
///
/// Created after the last sync means it is new and spreads to the other
/// side. Otherwise it existed at the last sync, so its absence on the other
/// side is a deletion that has to be mirrored.
pub fn for_orphan(present: Side, created: i64, last_sync: i64) -> Operation {
    if created > last_sync {
        Operation::PropagateTo(present.other())
    } else {
        Operation::DeleteFrom(present)
    }
}
