// src/core/sanitize.rs

//! Redaction of sensitive attribute values in collected cluster files.
//!
//! Targets are the CIB snapshot and every scheduler input under `pengine/`,
//! any of which may be gzip- or bzip2-compressed. In test mode files are only
//! scanned; in apply mode each `value="..."` following a matched `name="P"`
//! attribute is rewritten to `value="******"` in place, re-encoded in the
//! original compression format, with mtime/atime restored so the collected
//! tree still reflects when the cluster wrote the file.

use crate::core::errors::Result;
use crate::core::utils::compress::{self, Codec};
use filetime::FileTime;
use regex::Regex;
use std::path::Path;
use tracing::{debug, warn};

/// The replacement every sanitized value gets.
const MASK: &str = "******";

pub struct Sanitizer {
    /// Matches a `name="..."` attribute with its trailing `value="..."`.
    attr: Regex,
    /// User-configured patterns a name must match to be considered sensitive.
    patterns: Vec<Regex>,
}

impl Sanitizer {
    pub fn new(patterns: &[String]) -> Result<Self> {
        let attr = Regex::new(r#"(name="([^"]+)"[^>]*?\bvalue=")([^"]*)(")"#)?;
        let patterns = patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { attr, patterns })
    }

    fn name_is_sensitive(&self, name: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(name))
    }

    /// Whether the line holds at least one sensitive attribute.
    pub fn line_needs_sanitizing(&self, line: &str) -> bool {
        self.attr
            .captures_iter(line)
            .any(|caps| self.name_is_sensitive(&caps[2]))
    }

    /// Rewrites every sensitive value on the line. Idempotent: a masked value
    /// rewrites to the same mask.
    pub fn sanitize_line(&self, line: &str) -> String {
        self.attr
            .replace_all(line, |caps: &regex::Captures| {
                if self.name_is_sensitive(&caps[2]) {
                    format!("{}{}{}", &caps[1], MASK, &caps[4])
                } else {
                    caps[0].to_string()
                }
            })
            .into_owned()
    }

    pub fn sanitize_text(&self, text: &str) -> String {
        let mut out: String = text
            .lines()
            .map(|l| self.sanitize_line(l))
            .collect::<Vec<_>>()
            .join("\n");
        if text.ends_with('\n') {
            out.push('\n');
        }
        out
    }

    /// Test mode: does the file contain any sensitive attribute?
    pub async fn test_file(&self, path: &Path) -> Result<bool> {
        let contents = compress::read_decoded_to_string(path).await?;
        Ok(contents.lines().any(|l| self.line_needs_sanitizing(l)))
    }

    /// Apply mode: rewrite in the original compression format, preserving the
    /// file's modification and access times.
    pub async fn apply_file(&self, path: &Path) -> Result<()> {
        let meta = tokio::fs::metadata(path).await?;
        let mtime = FileTime::from_last_modification_time(&meta);
        let atime = FileTime::from_last_access_time(&meta);

        let codec = Codec::for_path(path).await;
        let contents = compress::read_decoded_to_string(path).await?;
        let rewritten = self.sanitize_text(&contents);
        if rewritten != contents {
            compress::write_encoded(path, rewritten.as_bytes(), codec).await?;
            debug!("sanitized {}", path.display());
        }
        filetime::set_file_times(path, atime, mtime)?;
        Ok(())
    }
}

/// The sanitizer targets inside one node's working directory: the CIB
/// snapshot and the scheduler inputs.
fn targets_in(workdir: &Path) -> Vec<std::path::PathBuf> {
    let mut targets = Vec::new();
    let cib = workdir.join("cib.xml");
    if cib.is_file() {
        targets.push(cib);
    }
    let pengine = workdir.join("pengine");
    if pengine.is_dir() {
        if let Ok(entries) = std::fs::read_dir(&pengine) {
            for entry in entries.flatten() {
                if entry.path().is_file() {
                    targets.push(entry.path());
                }
            }
        }
    }
    targets.sort();
    targets
}

/// Runs the sanitizer over a node's working directory. In test mode (`apply
/// == false`) returns whether anything sensitive was found, so the caller can
/// issue the aggregate warning. In apply mode rewrites each offending file.
pub async fn sanitize_workdir(workdir: &Path, patterns: &[String], apply: bool) -> Result<bool> {
    let sanitizer = Sanitizer::new(patterns)?;
    let mut found = false;
    for target in targets_in(workdir) {
        match sanitizer.test_file(&target).await {
            Ok(true) => {
                found = true;
                if apply {
                    sanitizer.apply_file(&target).await?;
                }
            }
            Ok(false) => {}
            Err(e) => warn!("cannot scan {}: {}", target.display(), e),
        }
    }
    if found && !apply {
        warn!("sensitive data found in the CIB/PE files; use -s to sanitize");
    }
    Ok(found)
}
