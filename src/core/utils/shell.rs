// src/core/utils/shell.rs

//! External command execution.
//!
//! Every subcommand runs with `LC_ALL=POSIX` so output parsing is not at the
//! mercy of the host locale. Commands that are known to hang on dead mounts
//! (`df` and friends) go through the timeout guard, which yields an empty
//! result on expiry instead of wedging the collector.

use crate::core::errors::Result;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

/// Captured result of a finished subcommand.
#[derive(Debug, Clone)]
pub struct CmdOutput {
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

// A default output represents "could not run at all", not success.
impl Default for CmdOutput {
    fn default() -> Self {
        Self {
            status: -1,
            stdout: String::new(),
            stderr: String::new(),
        }
    }
}

impl CmdOutput {
    pub fn success(&self) -> bool {
        self.status == 0
    }
}

/// Runs `program` with `args`, capturing both streams.
pub async fn run(program: &str, args: &[&str]) -> Result<CmdOutput> {
    debug!("running: {} {}", program, args.join(" "));
    let out = Command::new(program)
        .args(args)
        .env("LC_ALL", "POSIX")
        .stdin(Stdio::null())
        .output()
        .await?;
    Ok(CmdOutput {
        status: out.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
    })
}

/// Runs a full command line, split on shell words.
pub async fn run_line(line: &str) -> Result<CmdOutput> {
    let words = shell_words::split(line)?;
    let Some((program, args)) = words.split_first() else {
        return Ok(CmdOutput::default());
    };
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    run(program, &args).await
}

/// Like [`run_line`], but gives up after `limit` and returns an empty output.
pub async fn run_line_with_timeout(line: &str, limit: Duration) -> CmdOutput {
    match tokio::time::timeout(limit, run_line(line)).await {
        Ok(Ok(out)) => out,
        Ok(Err(e)) => {
            warn!("command `{}` failed to start: {}", line, e);
            CmdOutput::default()
        }
        Err(_) => {
            warn!("command `{}` timed out after {:?}", line, limit);
            CmdOutput::default()
        }
    }
}

/// Convenience: stdout of a command line, with a trailing newline when
/// non-empty, or an empty string on any failure.
pub async fn output_of(line: &str) -> String {
    match run_line(line).await {
        Ok(out) if !out.stdout.is_empty() => {
            let mut s = out.stdout;
            if !s.ends_with('\n') {
                s.push('\n');
            }
            s
        }
        _ => String::new(),
    }
}

/// Whether `program` resolves on the PATH.
pub fn has_command(program: &str) -> bool {
    which::which(program).is_ok()
}

/// Prefixes a privileged cluster command with `sudo -u root` when this
/// process is not already root. Remote collectors are launched through sudo
/// by the master, so there this is a no-op.
pub fn privileged(line: &str) -> String {
    // SAFETY: geteuid has no failure modes.
    if unsafe { libc::geteuid() } == 0 {
        line.to_string()
    } else {
        format!("sudo -u root {line}")
    }
}
