use log::Level;
use std::path::Path;

/// Receives every filesystem action taken while propagating changes.
pub trait ProgressCallback {
    /// A single file was copied.
    fn copied(&self, source: &Path, destination: &Path);

    /// A file or directory was relocated.
    fn moved(&self, source: &Path, destination: &Path);

    /// A file or directory was removed for good.
    fn removed(&self, path: &Path);

    /// An excluded relative path was pruned and will not be visited.
    fn skipped(&self, relative_path: &Path);
}

/// A zero-sized struct with an empty implementation of ProgressCallback
pub struct EmptyProgressCallback;

impl ProgressCallback for EmptyProgressCallback {
    fn copied(&self, _: &Path, _: &Path) {}
    fn moved(&self, _: &Path, _: &Path) {}
    fn removed(&self, _: &Path) {}
    fn skipped(&self, _: &Path) {}
}

/// Reports through the `log` facade, at `info` when verbose and `debug` otherwise.
pub struct LogProgressCallback {
    pub verbose: bool,
}

impl LogProgressCallback {
    pub fn new(verbose: bool) -> Self {
        LogProgressCallback { verbose }
    }

    fn level(&self) -> Level {
        if self.verbose {
            Level::Info
        } else {
            Level::Debug
        }
    }
}

impl ProgressCallback for LogProgressCallback {
    fn copied(&self, source: &Path, destination: &Path) {
        log!(self.level(), "COPY: {:?} -> {:?}", source, destination);
    }

    fn moved(&self, source: &Path, destination: &Path) {
        log!(self.level(), "MOVE: {:?} -> {:?}", source, destination);
    }

    fn removed(&self, path: &Path) {
        log!(self.level(), "DELETE: {:?}", path);
    }

    fn skipped(&self, relative_path: &Path) {
        log!(self.level(), "SKIP: {:?} is excluded", relative_path);
    }
}
