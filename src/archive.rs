//! The plain-text bookkeeping each side keeps at its root: the sync log and
//! the exclusion file.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;

use crate::error::{DescribeIoError, SyncError};
use crate::exclude::ExclusionSet;

/// The lines of a `.sync_log`, one `<nickname>,<epoch millis>` record per partner.
///
/// Lines that do not parse, or that belong to other partners, are kept
/// verbatim so that rewriting the log never loses them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncLog {
    lines: Vec<String>,
}

impl SyncLog {
    pub fn parse(contents: &str) -> Self {
        SyncLog {
            lines: contents
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(str::to_owned)
                .collect(),
        }
    }

    /// Reads the log at `path`, treating a missing file as an empty log.
    pub fn read(path: &Path) -> Result<Self, SyncError> {
        match fs::read_to_string(path) {
            Ok(contents) => Ok(SyncLog::parse(&contents)),
            Err(ref e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No sync log at {:?}, assuming no history", path);
                Ok(SyncLog::default())
            }
            Err(e) => Err(e).describe(|| format!("could not read sync log {:?}", path)),
        }
    }

    /// The last sync time recorded for `partner`, or 0 if there is none.
    /// Nicknames compare case-insensitively.
    pub fn last_sync(&self, partner: &str) -> i64 {
        self.lines
            .iter()
            .filter_map(|line| parse_record(line))
            .find(|&(nickname, _)| same_nickname(nickname, partner))
            .map(|(_, millis)| millis)
            .unwrap_or(0)
    }

    /// Replaces every line keyed by `partner` with a single fresh record.
    pub fn record(&mut self, partner: &str, millis: i64) {
        self.lines.retain(|line| match line_key(line) {
            Some(key) => !same_nickname(key, partner),
            None => true,
        });
        self.lines.push(format!("{},{}", partner, millis));
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }

    pub fn write(&self, path: &Path) -> Result<(), SyncError> {
        fs::write(path, self.render()).describe(|| format!("could not write sync log {:?}", path))
    }
}

fn line_key(line: &str) -> Option<&str> {
    line.find(',').map(|comma| line[..comma].trim())
}

fn parse_record(line: &str) -> Option<(&str, i64)> {
    let key = line_key(line)?;
    let millis = line[line.find(',')? + 1..].trim().parse().ok()?;
    if key.is_empty() {
        None
    } else {
        Some((key, millis))
    }
}

fn same_nickname(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.trim().to_lowercase()
}

/// Reads an exclusion file, creating it empty if it is missing.
pub fn read_exclusions(path: &Path) -> Result<ExclusionSet, SyncError> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(contents.lines().map(str::trim).collect()),
        Err(ref e) if e.kind() == io::ErrorKind::NotFound => {
            info!("Creating empty exclusion file {:?}", path);
            OpenOptions::new()
                .write(true)
                .create(true)
                .open(path)
                .describe(|| format!("could not create exclusion file {:?}", path))?;
            Ok(ExclusionSet::nothing())
        }
        Err(e) => Err(e).describe(|| format!("could not read exclusion file {:?}", path)),
    }
}

/// Rewrites an exclusion file wholesale, one entry per line in sorted order.
pub fn write_exclusions(path: &Path, exclusions: &ExclusionSet) -> Result<(), SyncError> {
    let mut out = String::new();
    for entry in exclusions.sorted() {
        out.push_str(&entry.to_string_lossy());
        out.push('\n');
    }
    fs::write(path, out).describe(|| format!("could not write exclusion file {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn last_sync_is_keyed_by_partner_case_insensitively() {
        let log = SyncLog::parse("laptop,100\nDesktop,200\n");
        assert_eq!(log.last_sync("desktop"), 200);
        assert_eq!(log.last_sync("LAPTOP"), 100);
        assert_eq!(log.last_sync("server"), 0);
    }

    #[test]
    fn malformed_lines_are_ignored_but_preserved() {
        let mut log = SyncLog::parse("garbage line\nlaptop,notanumber\nserver,42\n");
        assert_eq!(log.last_sync("laptop"), 0);
        assert_eq!(log.last_sync("server"), 42);

        log.record("server", 99);
        assert_eq!(log.render(), "garbage line\nlaptop,notanumber\nserver,99\n");
    }

    #[test]
    fn record_replaces_only_the_partner_line() {
        let mut log = SyncLog::parse("laptop,100\nDESKTOP,200\nphone,300\n");
        log.record("desktop", 500);
        assert_eq!(log.render(), "laptop,100\nphone,300\ndesktop,500\n");
        assert_eq!(log.last_sync("desktop"), 500);
    }

    #[test]
    fn missing_log_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        let log = SyncLog::read(&dir.path().join(".sync_log")).unwrap();
        assert_eq!(log, SyncLog::default());
        assert_eq!(log.last_sync("anyone"), 0);
    }

    #[test]
    fn missing_exclusion_file_is_created_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".sync_exclude");
        let set = read_exclusions(&path).unwrap();
        assert!(set.is_empty());
        assert!(path.is_file());
    }

    #[test]
    fn exclusions_are_written_one_per_line() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".sync_exclude");
        let set: ExclusionSet = vec!["target", "a/b"].into_iter().collect();
        write_exclusions(&path, &set).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "a/b\ntarget\n");
        assert_eq!(read_exclusions(&path).unwrap(), set);
    }
}
