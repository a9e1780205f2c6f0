// src/core/utils/grep.rs

//! In-process grep over files, directories, globs and command output.
//!
//! This replaces the external `grep(1)` calls the collection steps would
//! otherwise fork for every probed file. Flag semantics follow the usual
//! suspects: `v` invert, `i` case-insensitive, `w` whole word, `n` numbered,
//! `l` matching file names only, `q` boolean.

use crate::core::errors::Result;
use crate::core::utils::shell;
use bitflags::bitflags;
use regex::RegexBuilder;
use std::path::{Path, PathBuf};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct GrepFlags: u8 {
        const INVERT      = 1 << 0;
        const IGNORE_CASE = 1 << 1;
        const WORD        = 1 << 2;
        const NUMBERED    = 1 << 3;
        const NAMES_ONLY  = 1 << 4;
    }
}

fn build_regex(pattern: &str, flags: GrepFlags) -> Result<regex::Regex> {
    let pattern = if flags.contains(GrepFlags::WORD) {
        format!(r"\b{pattern}\b")
    } else {
        pattern.to_string()
    };
    Ok(RegexBuilder::new(&pattern)
        .case_insensitive(flags.contains(GrepFlags::IGNORE_CASE))
        .build()?)
}

/// Greps `text` line by line.
pub fn grep_text(pattern: &str, text: &str, flags: GrepFlags) -> Result<Vec<String>> {
    let re = build_regex(pattern, flags)?;
    let invert = flags.contains(GrepFlags::INVERT);
    let numbered = flags.contains(GrepFlags::NUMBERED);
    let mut res = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        if re.is_match(line) != invert {
            if numbered {
                res.push(format!("{}:{}", idx + 1, line));
            } else {
                res.push(line.to_string());
            }
        }
    }
    Ok(res)
}

fn grep_file(pattern: &str, file: &Path, flags: GrepFlags) -> Result<Vec<String>> {
    let Ok(contents) = std::fs::read_to_string(file) else {
        // Unreadable or binary files contribute nothing.
        return Ok(Vec::new());
    };
    let res = grep_text(pattern, &contents, flags)?;
    if flags.contains(GrepFlags::NAMES_ONLY) && !res.is_empty() {
        return Ok(vec![file.display().to_string()]);
    }
    Ok(res)
}

fn walk(dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            walk(&path, out);
        } else if path.is_file() {
            out.push(path);
        }
    }
}

/// Greps a path that may be a plain file, a directory (recursed) or a glob.
pub fn grep_path(pattern: &str, target: &Path, flags: GrepFlags) -> Result<Vec<String>> {
    let mut res = Vec::new();
    if target.is_file() {
        res = grep_file(pattern, target, flags)?;
    } else if target.is_dir() {
        let mut files = Vec::new();
        walk(target, &mut files);
        for f in files {
            res.extend(grep_file(pattern, &f, flags)?);
        }
    } else {
        for entry in glob::glob(&target.display().to_string())?.flatten() {
            if entry.is_file() {
                res.extend(grep_file(pattern, &entry, flags)?);
            }
        }
    }
    Ok(res)
}

/// Greps the stdout of a command line.
pub async fn grep_command(pattern: &str, line: &str, flags: GrepFlags) -> Result<Vec<String>> {
    let out = shell::output_of(line).await;
    grep_text(pattern, &out, flags)
}

/// The `q` flag: does anything in `target` match?
pub fn grep_quiet(pattern: &str, target: &Path, flags: GrepFlags) -> bool {
    grep_path(pattern, target, flags)
        .map(|r| !r.is_empty())
        .unwrap_or(false)
}
