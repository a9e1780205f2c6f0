// src/config.rs

//! The effective report configuration.
//!
//! Built once per process: on the master from the parsed command line, on a
//! collector from the serialized `KEY=VALUE` environment the master passed on
//! the remote command line. The descriptor part (everything a collector needs
//! to reproduce the master's decisions) round-trips through
//! [`ReportConfig::to_env_string`] / [`ReportConfig::from_env_tokens`].

use crate::core::errors::{ReportError, Result};
use chrono::Local;
use std::path::PathBuf;
use tracing::warn;

/// Default attribute-name patterns considered sensitive by the sanitizer.
pub const DEFAULT_SANITIZE_PATTERNS: &[&str] = &["passw.*"];

/// Default log patterns the analysis pass greps for.
pub const DEFAULT_ANALYSIS_PATTERNS: &[&str] = &["CRIT:", "ERROR:"];

/// Default auxiliary log collected alongside the cluster log.
pub const DEFAULT_EXTRA_LOG: &str = "/var/log/messages";

/// The sentinel first argument that switches the binary into collector mode.
pub const COLLECTOR_SENTINEL: &str = "__slave";

/// The complete configuration of one report run.
///
/// Fields up to `verbosity` form the report descriptor and are serialized to
/// every collector; the rest only steer the master process.
#[derive(Debug, Clone)]
pub struct ReportConfig {
    /// Basename of the report.
    pub dest: String,
    /// Window lower bound, seconds since the epoch. Always > 0.
    pub from_time: f64,
    /// Window upper bound, seconds since the epoch. 0 means "now".
    pub to_time: f64,
    /// Node names supplied by the user, taking precedence over discovery.
    pub user_nodes: Vec<String>,
    /// The resolved node table.
    pub nodes: Vec<String>,
    /// Primary cluster log path; empty until discovery.
    pub ha_log: String,
    /// Sensitive attribute-name patterns.
    pub sanitize_patterns: Vec<String>,
    /// Apply mode (`-s`) vs. test mode for the sanitizer.
    pub do_sanitize: bool,
    /// 0 collects everything; >= 1 skips the expensive steps.
    pub skip_lvl: u32,
    /// Auxiliary logs to collect.
    pub extra_logs: Vec<String>,
    /// Pacemaker's own log path, when known.
    pub pcmk_log: String,
    /// Log verbosity as counted `-v` flags.
    pub verbosity: u32,

    // Master-only settings, never serialized to collectors.
    /// Directory the finished report lands in.
    pub dest_dir: PathBuf,
    /// Explicit `-u` remote user, if any.
    pub ssh_user: Option<String>,
    /// Extra `ssh(1)` options.
    pub ssh_opts: Vec<String>,
    /// Patterns for the analysis pass.
    pub analysis_patterns: Vec<String>,
    /// Editor for the interactive description.
    pub editor: Option<String>,
    /// `-d`: leave the report as a directory instead of a tarball.
    pub no_compress: bool,
    /// `-S`: do not contact other nodes.
    pub single_node: bool,
    /// `-D`: skip the interactive description editor.
    pub no_description: bool,
    /// `-Z`: remove an existing destination instead of refusing.
    pub force_remove: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            dest: default_report_name(),
            from_time: 0.0,
            to_time: 0.0,
            user_nodes: Vec::new(),
            nodes: Vec::new(),
            ha_log: String::new(),
            sanitize_patterns: DEFAULT_SANITIZE_PATTERNS.iter().map(|s| s.to_string()).collect(),
            do_sanitize: false,
            skip_lvl: 0,
            extra_logs: vec![DEFAULT_EXTRA_LOG.to_string()],
            pcmk_log: String::new(),
            verbosity: 0,
            dest_dir: PathBuf::from("."),
            ssh_user: None,
            ssh_opts: Vec::new(),
            analysis_patterns: DEFAULT_ANALYSIS_PATTERNS.iter().map(|s| s.to_string()).collect(),
            editor: None,
            no_compress: false,
            single_node: false,
            no_description: false,
            force_remove: false,
        }
    }
}

/// `hb_report-<weekday>-<dd>-<mm>-<yyyy>`, the name used when the user gives
/// no destination.
pub fn default_report_name() -> String {
    Local::now().format("hb_report-%a-%d-%m-%Y").to_string()
}

/// A destination must be a simple file name: no separators, no parent refs.
pub fn is_safe_name(name: &str) -> bool {
    !name.is_empty() && !name.contains('/') && name != "." && name != ".."
}

impl ReportConfig {
    /// Checks the window invariant: `FROM > 0`, and `FROM <= TO` when a
    /// finite upper bound was given.
    pub fn validate_window(&self) -> Result<()> {
        if self.from_time <= 0.0 {
            return Err(ReportError::BadTimeSpec("-f".into()));
        }
        if self.to_time > 0.0 && self.from_time > self.to_time {
            return Err(ReportError::BadTimeSpec(
                "start time must not be later than finish time".into(),
            ));
        }
        Ok(())
    }

    /// Validates the destination name and directory on the master.
    pub fn validate_dest(&self) -> Result<()> {
        if !is_safe_name(&self.dest) {
            return Err(ReportError::UnsafeDestination(self.dest.clone()));
        }
        if !self.dest_dir.is_dir() {
            return Err(ReportError::MissingDestDir(self.dest_dir.clone()));
        }
        Ok(())
    }

    /// Serializes the descriptor as shell-word-safe `KEY=VALUE` tokens.
    pub fn to_env_string(&self) -> String {
        let pairs: Vec<(&str, String)> = vec![
            ("DEST", self.dest.clone()),
            ("FROM_TIME", self.from_time.to_string()),
            ("TO_TIME", self.to_time.to_string()),
            ("USER_NODES", self.user_nodes.join(" ")),
            ("NODES", self.nodes.join(" ")),
            ("HA_LOG", self.ha_log.clone()),
            ("SANITIZE", self.sanitize_patterns.join(" ")),
            ("DO_SANITIZE", if self.do_sanitize { "1" } else { "0" }.to_string()),
            ("SKIP_LVL", self.skip_lvl.to_string()),
            ("EXTRA_LOGS", self.extra_logs.join(" ")),
            ("PCMK_LOG", self.pcmk_log.clone()),
            ("VERBOSITY", self.verbosity.to_string()),
        ];
        pairs
            .into_iter()
            .map(|(k, v)| format!("{}={}", k, shell_words::quote(&v)))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Reconstructs a collector's configuration from the `KEY=VALUE` tokens
    /// it received as positional arguments.
    pub fn from_env_tokens(tokens: &[String]) -> Result<Self> {
        let mut config = ReportConfig::default();
        for token in tokens {
            let Some((key, value)) = token.split_once('=') else {
                return Err(ReportError::BadEnvToken(token.clone()));
            };
            match key {
                "DEST" => config.dest = value.to_string(),
                "FROM_TIME" => {
                    config.from_time = value
                        .parse()
                        .map_err(|_| ReportError::BadEnvToken(token.clone()))?
                }
                "TO_TIME" => {
                    config.to_time = value
                        .parse()
                        .map_err(|_| ReportError::BadEnvToken(token.clone()))?
                }
                "USER_NODES" => config.user_nodes = split_words(value),
                "NODES" => config.nodes = split_words(value),
                "HA_LOG" => config.ha_log = value.to_string(),
                "SANITIZE" => config.sanitize_patterns = split_words(value),
                "DO_SANITIZE" => config.do_sanitize = value == "1",
                "SKIP_LVL" => {
                    config.skip_lvl = value
                        .parse()
                        .map_err(|_| ReportError::BadEnvToken(token.clone()))?
                }
                "EXTRA_LOGS" => config.extra_logs = split_words(value),
                "PCMK_LOG" => config.pcmk_log = value.to_string(),
                "VERBOSITY" => {
                    config.verbosity = value
                        .parse()
                        .map_err(|_| ReportError::BadEnvToken(token.clone()))?
                }
                other => warn!("ignoring unknown environment key {}", other),
            }
        }
        config.validate_window()?;
        Ok(config)
    }

}

fn split_words(value: &str) -> Vec<String> {
    value.split_whitespace().map(|s| s.to_string()).collect()
}
