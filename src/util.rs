use fnv::FnvHasher;
use std::collections::HashSet;
use std::hash::BuildHasherDefault;
use std::time::{SystemTime, UNIX_EPOCH};

pub type FnvHashSet<T> = HashSet<T, BuildHasherDefault<FnvHasher>>;

/// Milliseconds since the unix epoch, negative for earlier instants.
pub fn epoch_millis(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(since) => since.as_millis() as i64,
        Err(e) => -(e.duration().as_millis() as i64),
    }
}

pub fn now_millis() -> i64 {
    epoch_millis(SystemTime::now())
}

/// Renders epoch millis as a local date-time for prompts and reports.
pub fn format_millis(millis: i64) -> String {
    use chrono::{Local, TimeZone};

    match Local.timestamp_millis_opt(millis).single() {
        Some(time) => time.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => format!("{} ms", millis),
    }
}
