//! Two-way reconciliation of a pair of directory trees.
//!
//! Each side remembers when it last completed a sync with its partner.
//! Anything modified after that instant on exactly one side is copied over,
//! anything missing on one side is either new (copied) or deleted (trashed)
//! depending on its creation time, and files modified on both sides are left
//! for the operator to decide. Nothing is ever deleted outright during a
//! run: displaced content is moved into a per-side trash first.

#[macro_use]
extern crate log;

pub mod archive;
pub mod config;
pub mod conflict;
pub mod detect;
pub mod error;
pub mod exclude;
pub mod prompt;
pub mod propagate;
pub mod reconcile;
pub mod session;
pub mod side;
pub mod state;
pub mod trash;
pub mod util;

pub use crate::config::{SideInfo, SyncInfo};
pub use crate::error::{OperationFailure, SyncError};
pub use crate::session::{synchronize, SessionReport};
pub use crate::side::{Side, SidePair, SideState};
