use std::error::Error;
use std::fmt;
use std::io;
use std::path::PathBuf;
use walkdir::Error as WalkDirError;

/// Which timestamp of an entry could not be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampKind {
    Created,
    Modified,
}

#[derive(Debug)]
pub enum SyncError {
    /// The same relative path is a file on one side and a directory on the other.
    StructuralMismatch { a: PathBuf, b: PathBuf },
    RootDoesntExist(PathBuf),
    /// One root lies inside the other.
    OverlappingRoots(PathBuf, PathBuf),
    /// Both sides were given the same nickname, so their log keys would collide.
    SameNickname(String),
    /// Nicknames are log keys, so they must be non-empty single-line text without commas.
    InvalidNickname(String),
    AbsolutePathProvided(PathBuf),
    /// The log, exclusion file or trash directory of a side could not be established or rewritten.
    Bookkeeping { description: String, error: io::Error },
    Copy { source: PathBuf, destination: PathBuf, error: io::Error },
    Move { source: PathBuf, destination: PathBuf, error: io::Error },
    Remove { path: PathBuf, error: io::Error },
    Metadata { path: PathBuf, error: io::Error },
    TimestampUnavailable { path: PathBuf, kind: TimestampKind, error: io::Error },
    /// The source of interactive answers closed before a question was answered.
    Prompt(io::Error),
    IoError(io::Error),
    WalkDirError(WalkDirError),
}

impl SyncError {
    /// Fatal errors abort the whole session before anything is persisted.
    /// Everything else only invalidates the path it happened on.
    pub fn is_fatal(&self) -> bool {
        match *self {
            SyncError::StructuralMismatch { .. }
            | SyncError::RootDoesntExist(_)
            | SyncError::OverlappingRoots(..)
            | SyncError::SameNickname(_)
            | SyncError::InvalidNickname(_)
            | SyncError::AbsolutePathProvided(_)
            | SyncError::Bookkeeping { .. }
            | SyncError::Prompt(_) => true,
            _ => false,
        }
    }
}

impl From<io::Error> for SyncError {
    fn from(e: io::Error) -> Self {
        SyncError::IoError(e)
    }
}

impl From<WalkDirError> for SyncError {
    fn from(e: WalkDirError) -> Self {
        SyncError::WalkDirError(e)
    }
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            SyncError::StructuralMismatch { ref a, ref b } => write!(
                f,
                "{:?} and {:?} are not the same kind of entry (file vs directory), refusing to continue",
                a, b
            ),
            SyncError::RootDoesntExist(ref root) => write!(f, "root does not exist or is not a directory: {:?}", root),
            SyncError::OverlappingRoots(ref a, ref b) => write!(f, "roots {:?} and {:?} overlap", a, b),
            SyncError::SameNickname(ref nickname) => write!(f, "both sides use the nickname {:?}", nickname),
            SyncError::InvalidNickname(ref nickname) => write!(
                f,
                "{:?} cannot be used as a nickname (it must be non-empty and contain no commas or line breaks)",
                nickname
            ),
            SyncError::AbsolutePathProvided(ref path) => write!(
                f,
                "the absolute path {:?} is invalid (hint: paths must be relative to the side's root)",
                path
            ),
            SyncError::Bookkeeping { ref description, ref error } => write!(f, "{}: {}", description, error),
            SyncError::Copy { ref source, ref destination, ref error } => {
                write!(f, "copying {:?} to {:?} failed: {}", source, destination, error)
            }
            SyncError::Move { ref source, ref destination, ref error } => {
                write!(f, "moving {:?} to {:?} failed: {}", source, destination, error)
            }
            SyncError::Remove { ref path, ref error } => write!(f, "removing {:?} failed: {}", path, error),
            SyncError::Metadata { ref path, ref error } => write!(f, "reading metadata of {:?} failed: {}", path, error),
            SyncError::TimestampUnavailable { ref path, kind, ref error } => {
                let kind = match kind {
                    TimestampKind::Created => "creation",
                    TimestampKind::Modified => "modification",
                };
                write!(f, "the {} time of {:?} is unavailable: {}", kind, path, error)
            }
            SyncError::Prompt(ref e) => write!(f, "no answer could be read: {}", e),
            SyncError::IoError(ref io) => write!(f, "io error: {}", io),
            SyncError::WalkDirError(ref e) => write!(f, "walk dir error: {}", e),
        }
    }
}

impl Error for SyncError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match *self {
            SyncError::Bookkeeping { ref error, .. }
            | SyncError::Copy { ref error, .. }
            | SyncError::Move { ref error, .. }
            | SyncError::Remove { ref error, .. }
            | SyncError::Metadata { ref error, .. }
            | SyncError::TimestampUnavailable { ref error, .. }
            | SyncError::Prompt(ref error)
            | SyncError::IoError(ref error) => Some(error),
            SyncError::WalkDirError(ref e) => Some(e),
            _ => None,
        }
    }
}

/// Attaches a description to bookkeeping I/O, turning it into a fatal `SyncError`.
pub trait DescribeIoError<T> {
    fn describe<F: FnOnce() -> String>(self, f: F) -> Result<T, SyncError>;
}

impl<T> DescribeIoError<T> for io::Result<T> {
    fn describe<F: FnOnce() -> String>(self, f: F) -> Result<T, SyncError> {
        self.map_err(|error| SyncError::Bookkeeping { description: f(), error })
    }
}

/// A non-fatal failure recorded against one relative path. The run continues past it.
#[derive(Debug)]
pub struct OperationFailure {
    pub path: PathBuf,
    pub error: SyncError,
}

impl fmt::Display for OperationFailure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}: {}", self.path, self.error)
    }
}
