// src/core/logtime/stamp.rs

//! Timestamp grammars found in cluster logs and the per-file format cache.
//!
//! Three grammars cover the rotated logs in the wild: RFC 5424 (field 0 is an
//! ISO 8601 stamp), classic syslog (fields 0-2 form e.g. `May 17 15:52:40`),
//! and the legacy heartbeat layout where field 1 carries the stamp. A file's
//! format is detected once from its leading lines and cached process-wide;
//! collectors on other nodes are separate processes with their own caches.

use chrono::{DateTime, Datelike, Local, NaiveDateTime, TimeZone};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// How many leading lines are probed before a file is given up on.
pub const DETECT_PROBE_LINES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StampFormat {
    Rfc5424,
    Syslog,
    Legacy,
}

static FORMAT_CACHE: Lazy<Mutex<HashMap<PathBuf, Option<StampFormat>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Parses a standalone stamp string to epoch seconds. Accepts ISO 8601 with
/// or without zone offset, `May 17 15:52:40` syslog shape (current year),
/// `2017/01/26_11:04:19` heartbeat shape, and bare epoch seconds.
pub fn parse_to_timestamp(s: &str) -> Option<f64> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(epoch_of(dt.timestamp(), dt.timestamp_subsec_nanos()));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y/%m/%d_%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return local_epoch(naive);
        }
    }
    if let Some(ts) = parse_syslog_stamp(s) {
        return Some(ts);
    }
    if let Ok(epoch) = s.parse::<f64>() {
        if epoch > 0.0 {
            return Some(epoch);
        }
    }
    None
}

/// `May 17 15:52:40` carries no year; assume the current one.
fn parse_syslog_stamp(s: &str) -> Option<f64> {
    let with_year = format!("{} {}", Local::now().year(), s);
    NaiveDateTime::parse_from_str(&with_year, "%Y %b %d %H:%M:%S")
        .ok()
        .and_then(local_epoch)
}

fn local_epoch(naive: NaiveDateTime) -> Option<f64> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| epoch_of(dt.timestamp(), dt.timestamp_subsec_nanos()))
}

fn epoch_of(secs: i64, nanos: u32) -> f64 {
    secs as f64 + f64::from(nanos) / 1e9
}

/// An ISO 8601 stamp, with or without a zone offset.
fn is_iso_stamp(s: &str) -> bool {
    DateTime::parse_from_rfc3339(s).is_ok()
        || NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
}

/// Classifies a single line under the three grammars.
pub fn detect_line_format(line: &str) -> Option<StampFormat> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    match fields.first() {
        Some(first) if is_iso_stamp(first) => {
            return Some(StampFormat::Rfc5424);
        }
        _ => {}
    }
    if fields.len() >= 3 {
        let joined = fields[..3].join(" ");
        if parse_syslog_stamp(&joined).is_some() {
            return Some(StampFormat::Syslog);
        }
    }
    if let Some(second) = fields.get(1) {
        if parse_to_timestamp(second).is_some() {
            return Some(StampFormat::Legacy);
        }
    }
    None
}

/// Extracts the epoch timestamp of a line already known to use `format`.
pub fn get_ts(line: &str, format: StampFormat) -> Option<f64> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    match format {
        StampFormat::Rfc5424 => fields.first().and_then(|f| parse_to_timestamp(f)),
        StampFormat::Syslog => {
            if fields.len() < 3 {
                return None;
            }
            parse_syslog_stamp(&fields[..3].join(" "))
        }
        StampFormat::Legacy => fields.get(1).and_then(|f| parse_to_timestamp(f)),
    }
}

/// Detects the stamp format of a file from its leading lines, consulting and
/// filling the process-wide cache. `None` means no detector applies and the
/// file is skipped by the extractor.
pub fn format_for_file(path: &Path, leading_lines: &[String]) -> Option<StampFormat> {
    if let Some(cached) = FORMAT_CACHE.lock().get(path) {
        return *cached;
    }
    let detected = leading_lines
        .iter()
        .take(DETECT_PROBE_LINES)
        .find_map(|line| detect_line_format(line));
    FORMAT_CACHE.lock().insert(path.to_path_buf(), detected);
    detected
}

/// The first parseable timestamp among `lines`, probing at most
/// [`DETECT_PROBE_LINES`] of them.
pub fn first_ts_in<'a>(lines: impl Iterator<Item = &'a str>, format: StampFormat) -> Option<f64> {
    lines
        .take(DETECT_PROBE_LINES)
        .find_map(|line| get_ts(line, format))
}
