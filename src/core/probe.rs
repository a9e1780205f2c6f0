// src/core/probe.rs

//! Discovery of the cluster stack's on-disk layout.
//!
//! Runs once per process, before any collection step. Everything here is
//! plain filesystem probing; the resulting [`ClusterEnv`] is immutable and
//! passed explicitly to the steps that need paths. The probe is rooted so
//! tests can point it at a scratch tree instead of `/`.

use crate::core::errors::{ReportError, Result};
use crate::core::utils::grep::{self, GrepFlags};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Candidate locations of the pacemaker daemon directory, relative to root.
const DAEMON_DIR_CANDIDATES: &[&str] = &[
    "usr/lib/pacemaker",
    "usr/libexec/pacemaker",
    "usr/lib64/pacemaker",
];

/// Candidate CIB directories.
const CIB_DIR_CANDIDATES: &[&str] = &["var/lib/pacemaker/cib", "var/lib/heartbeat/crm"];

/// Candidate scheduler state directories.
const PE_STATE_DIR_CANDIDATES: &[&str] = &["var/lib/pacemaker/pengine", "var/lib/heartbeat/pengine"];

const OCF_ROOT_DEFAULT: &str = "usr/lib/ocf";
const COROSYNC_CONF: &str = "etc/corosync/corosync.conf";
const COROSYNC_LIB: &str = "var/lib/corosync";

/// The probed cluster environment.
#[derive(Debug, Clone)]
pub struct ClusterEnv {
    pub ocf_dir: PathBuf,
    pub ha_varlib: PathBuf,
    pub ha_bin: PathBuf,
    pub crm_daemon_dir: PathBuf,
    pub pe_state_dir: PathBuf,
    pub cib_dir: PathBuf,
    pub pcmk_lib: PathBuf,
    pub cores_dirs: Vec<PathBuf>,
    /// "debug" when corosync logging has debug on, else "info".
    pub loglevel: String,
    /// Log file configured in corosync.conf, if any.
    pub corosync_logfile: Option<PathBuf>,
    pub syslog_facility: String,
}

impl ClusterEnv {
    /// Probes the live system.
    pub fn probe() -> Result<ClusterEnv> {
        Self::probe_from(Path::new("/"))
    }

    /// Probes a tree rooted at `root`. The `OCF_ROOT` override only applies
    /// to live-system probes.
    pub fn probe_from(root: &Path) -> Result<ClusterEnv> {
        let ocf_dir = match std::env::var("OCF_ROOT") {
            Ok(dir) if !dir.is_empty() && root == Path::new("/") => PathBuf::from(dir),
            _ => root.join(OCF_ROOT_DEFAULT),
        };
        if !ocf_dir.is_dir() {
            return Err(ReportError::MissingDir(ocf_dir));
        }

        let (ha_varlib, ha_bin) = load_ocf_dirs(&ocf_dir)?;

        let crm_daemon_dir = DAEMON_DIR_CANDIDATES
            .iter()
            .map(|c| root.join(c))
            .find(|dir| dir.is_dir() && is_executable(&dir.join("crmd")))
            .ok_or(ReportError::NoDaemonDir)?;

        let cib_dir = first_existing_dir(root, CIB_DIR_CANDIDATES)
            .ok_or_else(|| ReportError::MissingDir(root.join(CIB_DIR_CANDIDATES[0])))?;
        let pe_state_dir = first_existing_dir(root, PE_STATE_DIR_CANDIDATES)
            .ok_or_else(|| ReportError::MissingDir(root.join(PE_STATE_DIR_CANDIDATES[0])))?;

        let pcmk_lib = cib_dir
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| cib_dir.clone());

        let mut cores_dirs = vec![pcmk_lib.join("cores")];
        if root.join(COROSYNC_CONF).is_file() {
            cores_dirs.push(root.join(COROSYNC_LIB));
        }

        let (loglevel, corosync_logfile, syslog_facility) =
            corosync_logging(&root.join(COROSYNC_CONF));

        debug!(
            "probed cluster layout: daemons {}, cib {}, pe {}",
            crm_daemon_dir.display(),
            cib_dir.display(),
            pe_state_dir.display()
        );
        Ok(ClusterEnv {
            ocf_dir,
            ha_varlib,
            ha_bin,
            crm_daemon_dir,
            pe_state_dir,
            cib_dir,
            pcmk_lib,
            cores_dirs,
            loglevel,
            corosync_logfile,
            syslog_facility,
        })
    }

    /// Picks the log to extract from, in precedence order: the first existing
    /// extra log that is not pacemaker's own, the journal collected into the
    /// working directory, the pacemaker log, the corosync debug file.
    pub fn find_log(
        &self,
        extra_logs: &[String],
        pcmk_log: &str,
        collected_journal: &Path,
    ) -> Option<PathBuf> {
        for extra in extra_logs {
            if extra == pcmk_log {
                continue;
            }
            let path = PathBuf::from(extra);
            if path.is_file() {
                return Some(path);
            }
        }
        if collected_journal.is_file() {
            return Some(collected_journal.to_path_buf());
        }
        if !pcmk_log.is_empty() {
            let path = PathBuf::from(pcmk_log);
            if path.is_file() {
                return Some(path);
            }
        }
        self.corosync_logfile.clone().filter(|p| p.is_file())
    }
}

/// Reads `HA_VARLIB` and `HA_BIN` out of the ocf-directories shell library,
/// which assigns them as `: ${HA_VARLIB:=/var/lib/heartbeat}` lines.
fn load_ocf_dirs(ocf_dir: &Path) -> Result<(PathBuf, PathBuf)> {
    let inf = ocf_dir.join("lib/heartbeat/ocf-directories");
    if !inf.is_file() {
        return Err(ReportError::MissingFile(inf));
    }
    let varlib = grep_assignment(&inf, "HA_VARLIB:=")?;
    let bin = grep_assignment(&inf, "HA_BIN:=")?;
    Ok((varlib, bin))
}

fn grep_assignment(file: &Path, pattern: &str) -> Result<PathBuf> {
    let hits = grep::grep_path(pattern, file, GrepFlags::empty())?;
    let line = hits
        .first()
        .ok_or_else(|| ReportError::Internal(format!("{} not found in {}", pattern, file.display())))?;
    let value = line
        .split_once(":=")
        .map(|(_, v)| v.trim_end().trim_end_matches('}'))
        .unwrap_or_default();
    Ok(PathBuf::from(value))
}

fn first_existing_dir(root: &Path, candidates: &[&str]) -> Option<PathBuf> {
    candidates.iter().map(|c| root.join(c)).find(|d| d.is_dir())
}

fn is_executable(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

/// Extracts loglevel, logfile and syslog facility from corosync.conf.
fn corosync_logging(conf: &Path) -> (String, Option<PathBuf>, String) {
    let mut loglevel = "info".to_string();
    let mut logfile = None;
    let mut facility = "daemon".to_string();
    if !conf.is_file() {
        return (loglevel, logfile, facility);
    }
    let Ok(contents) = std::fs::read_to_string(conf) else {
        warn!("cannot read {}", conf.display());
        return (loglevel, logfile, facility);
    };
    for line in contents.lines() {
        let line = line.trim();
        if let Some((key, value)) = line.split_once(':') {
            let value = value.trim();
            match key.trim() {
                "debug" if value == "on" => loglevel = "debug".to_string(),
                "logfile" if !value.is_empty() => logfile = Some(PathBuf::from(value)),
                "syslog_facility" if !value.is_empty() => facility = value.to_string(),
                _ => {}
            }
        }
    }
    (loglevel, logfile, facility)
}
