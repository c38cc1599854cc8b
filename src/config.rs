use std::path::PathBuf;

/// Exclusion rules shared by both sides, one relative path per line.
pub const EXCLUDE_FILE_NAME: &str = ".sync_exclude";
/// `<partner nickname>,<epoch millis>` records, one per line.
pub const LOG_FILE_NAME: &str = ".sync_log";
/// Staging area for displaced content, recreated empty each session.
pub const TRASH_DIR_NAME: &str = ".sync_trash";

/// One of the two directory trees taking part in a session.
#[derive(Debug, Clone)]
pub struct SideInfo {
    pub root: PathBuf,
    pub nickname: String,
}

impl SideInfo {
    pub fn new<P: Into<PathBuf>, S: Into<String>>(root: P, nickname: S) -> Self {
        SideInfo {
            root: root.into(),
            nickname: nickname.into(),
        }
    }
}

/// The configuration for one synchronization run.
#[derive(Debug, Clone)]
pub struct SyncInfo {
    pub a: SideInfo,
    pub b: SideInfo,
    /// Report every copy, move and skip at `info` level instead of `debug`.
    pub verbose: bool,
}

impl SyncInfo {
    pub fn new(a: SideInfo, b: SideInfo) -> Self {
        SyncInfo { a, b, verbose: false }
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}
