// src/core/logtime/search.rs

//! Binary search for a timestamp over line numbers.
//!
//! Rotated production logs routinely contain stretches that no stamp grammar
//! parses (multi-line dumps, truncated writes). When the probe line is
//! malformed, nearby lines are probed instead, walking outward from the
//! midpoint within the current window, up to ten attempts; after that the
//! file is declared corrupt for the purposes of this search and skipped with
//! a warning.

use crate::core::logtime::stamp::{StampFormat, get_ts};
use tracing::warn;

/// How many alternate probes a malformed midpoint gets.
const MALFORMED_RETRIES: usize = 10;

/// Finds the 1-based number of the first line whose timestamp is >= `target`.
/// Returns `None` when the file has no parseable line near the probe points.
pub fn findln_by_time(lines: &[String], target: f64, format: StampFormat) -> Option<usize> {
    if lines.is_empty() {
        return None;
    }
    let mut lo: usize = 1;
    let mut hi: usize = lines.len();
    let mut last_probe = None;

    while lo <= hi {
        let mid = (lo + hi) / 2;
        let Some((probe, ts)) = probe_near(lines, mid, lo, hi, format) else {
            warn!(
                "no parseable timestamps around line {}; giving up on this file",
                mid
            );
            return None;
        };

        last_probe = Some(probe);
        if ts > target {
            if probe == 1 {
                break;
            }
            hi = probe - 1;
        } else if ts < target {
            lo = probe + 1;
        } else {
            return Some(probe);
        }
    }
    last_probe
}

/// Extracts a timestamp at `mid`, or at the closest parseable line within
/// `[lo, hi]`, alternating below and above the midpoint.
fn probe_near(
    lines: &[String],
    mid: usize,
    lo: usize,
    hi: usize,
    format: StampFormat,
) -> Option<(usize, f64)> {
    if let Some(ts) = get_ts(&lines[mid - 1], format) {
        return Some((mid, ts));
    }
    for attempt in 1..=MALFORMED_RETRIES {
        let offset = attempt.div_ceil(2);
        let candidate = if attempt % 2 == 1 {
            mid.checked_add(offset).filter(|c| *c <= hi)
        } else {
            mid.checked_sub(offset).filter(|c| *c >= lo)
        };
        if let Some(line) = candidate {
            if let Some(ts) = get_ts(&lines[line - 1], format) {
                return Some((line, ts));
            }
        }
    }
    None
}

/// Walks `line` forward to the first line at or past `target`, skipping
/// unparseable lines. Used to tighten the lower bound after the search.
pub fn seek_first_at_or_after(
    lines: &[String],
    mut line: usize,
    target: f64,
    format: StampFormat,
) -> usize {
    while line <= lines.len() {
        match get_ts(&lines[line - 1], format) {
            Some(ts) if ts < target => line += 1,
            _ => break,
        }
    }
    line
}

/// Walks `line` backward to the last line at or before `target`. Returns 0
/// when every line up to `line` is past the target.
pub fn seek_last_at_or_before(
    lines: &[String],
    mut line: usize,
    target: f64,
    format: StampFormat,
) -> usize {
    while line >= 1 {
        match get_ts(&lines[line - 1], format) {
            Some(ts) if ts > target => {
                if line == 1 {
                    return 0;
                }
                line -= 1;
            }
            _ => break,
        }
    }
    line
}
