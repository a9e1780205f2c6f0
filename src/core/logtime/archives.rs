// src/core/logtime/archives.rs

//! Discovery and window classification of rotated log archives.
//!
//! For a primary log `L`, the candidate set is `{L}` plus every
//! `L*[0-z9]` sibling (`L.1`, `L.2.gz`, `L-20170126.xz`, ...), sorted
//! ascending by ctime. Each candidate is classified against the requested
//! window from its first and last few lines alone, so files wholly outside
//! the window are never fully read.

use crate::core::errors::Result;
use crate::core::logtime::stamp::{self, StampFormat};
use crate::core::utils::compress::{self, Codec};
use std::collections::VecDeque;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader};

/// Relation of one archive file to the requested window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Empty, unstampable, or entirely outside the window: skip.
    Outside,
    /// Entirely inside the window: include whole file.
    Inside,
    /// The window starts after this file ends; older files cannot match.
    BeforeWindow,
    /// The file straddles the window start: include, then stop looking.
    Straddler,
}

/// One discovered archive, with its decoded form and detected stamp format.
#[derive(Debug)]
pub struct Archive {
    /// The file as found on disk.
    pub path: PathBuf,
    /// Where to read plain text from: the file itself, or a registered temp
    /// file holding the decompressed content.
    pub decoded: PathBuf,
    pub format: Option<StampFormat>,
    pub head: Vec<String>,
    pub tail: Vec<String>,
}

/// Finds `{L} ∪ glob(L*[0-z9])`, ascending by ctime.
pub fn find_rotated_set(primary: &Path) -> Result<Vec<PathBuf>> {
    let mut set = vec![primary.to_path_buf()];
    let pattern = format!("{}*[0-z9]", primary.display());
    for entry in glob::glob(&pattern)?.flatten() {
        if entry.is_file() && entry != primary {
            set.push(entry);
        }
    }
    set.sort_by_key(|p| {
        std::fs::metadata(p)
            .map(|m| (m.ctime(), m.ctime_nsec()))
            .unwrap_or((0, 0))
    });
    Ok(set)
}

impl Archive {
    /// Opens a candidate: decompresses if needed, probes the leading and
    /// trailing lines, and detects the stamp format.
    pub async fn open(path: &Path) -> Result<Archive> {
        let decoded = match Codec::from_suffix(path) {
            Some(_) => compress::decompress_to_temp(path).await?,
            None => path.to_path_buf(),
        };
        let (head, tail) = head_tail_lines(&decoded, stamp::DETECT_PROBE_LINES).await?;
        let format = stamp::format_for_file(path, &head);
        Ok(Archive {
            path: path.to_path_buf(),
            decoded,
            format,
            head,
            tail,
        })
    }

    /// First parseable timestamps of the head and tail blocks.
    pub fn edge_timestamps(&self) -> Option<(f64, f64)> {
        let format = self.format?;
        let first = stamp::first_ts_in(self.head.iter().map(String::as_str), format)?;
        let last = stamp::first_ts_in(self.tail.iter().map(String::as_str), format)?;
        Some((first, last))
    }

    /// Classifies this archive against `[from, to]` (`to == 0` is open).
    pub fn classify(&self, from: f64, to: f64) -> Classification {
        let Some((first_ts, last_ts)) = self.edge_timestamps() else {
            return Classification::Outside;
        };
        if last_ts < from {
            return Classification::BeforeWindow;
        }
        if to > 0.0 && first_ts > to {
            return Classification::Outside;
        }
        if first_ts >= from {
            Classification::Inside
        } else {
            Classification::Straddler
        }
    }

    /// All lines of the decoded file.
    pub async fn read_lines(&self) -> Result<Vec<String>> {
        let contents = tokio::fs::read_to_string(&self.decoded).await?;
        Ok(contents.lines().map(|l| l.to_string()).collect())
    }
}

/// Streams the decoded file once, keeping the first and last `count` lines.
async fn head_tail_lines(path: &Path, count: usize) -> Result<(Vec<String>, Vec<String>)> {
    let file = tokio::fs::File::open(path).await?;
    let mut lines = BufReader::new(file).lines();
    let mut head = Vec::with_capacity(count);
    let mut tail: VecDeque<String> = VecDeque::with_capacity(count);
    while let Some(line) = lines.next_line().await? {
        if head.len() < count {
            head.push(line.clone());
        }
        if tail.len() == count {
            tail.pop_front();
        }
        tail.push_back(line);
    }
    Ok((head, tail.into_iter().collect()))
}
