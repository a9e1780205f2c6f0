// src/core/logtime/mod.rs

//! The log-window extractor: given a primary log and a `[from, to]` window,
//! emit exactly the log content inside the window, across rotated archives,
//! in chronological order.

pub mod archives;
pub mod search;
pub mod stamp;

use crate::core::errors::Result;
use archives::{Archive, Classification};
use search::{findln_by_time, seek_first_at_or_after, seek_last_at_or_before};
use std::path::Path;
use tracing::{debug, warn};

/// One slice of one archive scheduled for emission. An unset bound means
/// "from the start" / "to the end" of that file.
struct Segment {
    archive: Archive,
    from: Option<f64>,
    to: Option<f64>,
}

/// Extracts the window from the rotated set of `primary` and returns the
/// concatenated content. Missing or unstampable files degrade to warnings;
/// the caller gets whatever could be extracted.
pub async fn dump_log_window(primary: &Path, from: f64, to: f64) -> Result<String> {
    if !primary.is_file() {
        warn!("log file {} does not exist", primary.display());
        return Ok(String::new());
    }

    let candidates = archives::find_rotated_set(primary)?;
    let mut included: Vec<Archive> = Vec::new();

    // Walk newest to oldest; stop as soon as the window start is covered.
    for path in candidates.iter().rev() {
        let archive = match Archive::open(path).await {
            Ok(a) => a,
            Err(e) => {
                warn!("cannot open {}: {}", path.display(), e);
                continue;
            }
        };
        match archive.classify(from, to) {
            Classification::Outside => {
                debug!("{} is outside the window", path.display());
            }
            Classification::Inside => included.push(archive),
            Classification::BeforeWindow => break,
            Classification::Straddler => {
                included.push(archive);
                break;
            }
        }
    }

    // Collected newest-first; emit oldest-first. The oldest included file is
    // trimmed at the window start, the newest at the window end, everything
    // between goes out whole.
    included.reverse();
    let upper = (to > 0.0).then_some(to);
    let count = included.len();
    let mut out = String::new();
    for (idx, archive) in included.into_iter().enumerate() {
        let segment = Segment {
            from: (idx == 0).then_some(from),
            to: if idx + 1 == count { upper } else { None },
            archive,
        };
        out.push_str(&print_segment(&segment).await?);
    }
    Ok(out)
}

/// Emits the lines of one archive within the segment bounds.
async fn print_segment(segment: &Segment) -> Result<String> {
    let lines = segment.archive.read_lines().await?;
    if lines.is_empty() {
        return Ok(String::new());
    }
    let Some(format) = segment.archive.format else {
        return Ok(String::new());
    };

    let from_line = match segment.from {
        Some(target) => match findln_by_time(&lines, target, format) {
            Some(line) => seek_first_at_or_after(&lines, line, target, format),
            None => return Ok(String::new()),
        },
        None => 1,
    };
    let to_line = match segment.to {
        Some(target) => match findln_by_time(&lines, target, format) {
            Some(line) => seek_last_at_or_before(&lines, line, target, format),
            None => return Ok(String::new()),
        },
        None => lines.len(),
    };
    if from_line > to_line || from_line > lines.len() || to_line == 0 {
        return Ok(String::new());
    }

    let mut out = lines[from_line - 1..to_line].join("\n");
    out.push('\n');
    Ok(out)
}

