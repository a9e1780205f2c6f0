// src/core/collector/mod.rs

//! The collector role: everything that runs on one node to fill its per-node
//! directory, and the `__slave` entry point that streams that directory back
//! to the master as a tar archive on stdout.
//!
//! Collection steps run as parallel tasks writing disjoint files; a failing
//! step degrades to a warning and an empty section, never an abort, so the
//! analyst can see what was missing on that node.

pub mod sysinfo;

use crate::config::ReportConfig;
use crate::core::errors::{ReportError, Result};
use crate::core::logtime;
use crate::core::nodes;
use crate::core::probe::ClusterEnv;
use crate::core::sanitize;
use crate::core::utils::redirect::StdioRedirect;
use crate::core::utils::{shell, tarball, tempfiles};
use chrono::{DateTime, Local};
use regex::Regex;
use std::fmt::Write as _;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, UNIX_EPOCH};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Entry point for a process spawned with the collector sentinel. Parses the
/// serialized environment, collects locally and writes the tar stream to
/// stdout; that stream is the sole transport back to the master.
pub async fn run(tokens: &[String]) -> Result<()> {
    let config = ReportConfig::from_env_tokens(tokens)?;
    let env = ClusterEnv::probe()?;
    let node = nodes::local_hostname();

    let parent = tempfiles::create_work_dir()?;
    let node_dir = parent.join(&node);
    tokio::fs::create_dir_all(&node_dir).await?;

    collect_node(&config, &env, &node_dir).await?;

    tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout().lock();
        tarball::stream_dir(&parent, &node, stdout)
    })
    .await
    .map_err(|e| ReportError::Internal(format!("tar stream task failed: {e}")))??;
    Ok(())
}

/// Fills `node_dir` with this node's collection results. Shared between the
/// remote collector and the master's inline local collection.
pub async fn collect_node(config: &ReportConfig, env: &ClusterEnv, node_dir: &Path) -> Result<()> {
    let mut tasks: JoinSet<Result<()>> = JoinSet::new();

    {
        let dir = node_dir.to_path_buf();
        tasks.spawn(async move {
            sysinfo::write_sysinfo(&dir.join("sysinfo.txt")).await?;
            sysinfo::write_sysstats(&dir.join("sysstats.txt")).await
        });
    }
    {
        let dir = node_dir.to_path_buf();
        let config = config.clone();
        let env = env.clone();
        tasks.spawn(async move { collect_cluster_state(&config, &env, &dir).await });
    }
    {
        let dir = node_dir.to_path_buf();
        let config = config.clone();
        let env = env.clone();
        tasks.spawn(async move { collect_logs(&config, &env, &dir).await });
    }
    {
        let dir = node_dir.to_path_buf();
        let config = config.clone();
        let env = env.clone();
        tasks.spawn(async move { collect_state_dumps(&config, &env, &dir).await });
    }
    {
        let dir = node_dir.to_path_buf();
        let env = env.clone();
        tasks.spawn(async move { collect_config_snapshot(&env, &dir).await });
    }

    let mut fatal = None;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(())) => {}
            // Resource exhaustion must abort the run; everything else is a
            // warning recorded by the missing section itself.
            Ok(Err(e @ (ReportError::DiskFull(_) | ReportError::TempFile(_)))) => {
                fatal.get_or_insert(e);
            }
            Ok(Err(e)) => warn!("collection step failed: {}", e),
            Err(e) => warn!("collection step panicked: {}", e),
        }
    }
    if let Some(e) = fatal {
        return Err(e);
    }

    sanitize::sanitize_workdir(node_dir, &config.sanitize_patterns, config.do_sanitize).await?;
    Ok(())
}

/// Cluster status, CIB snapshot and the RUNNING/STOPPED and DC sentinels.
async fn collect_cluster_state(
    config: &ReportConfig,
    env: &ClusterEnv,
    node_dir: &Path,
) -> Result<()> {
    let mon = shell::run_line(&shell::privileged("crm_mon -1r")).await.unwrap_or_default();
    let running = mon.success();
    tokio::fs::write(node_dir.join("crm_mon.txt"), &mon.stdout).await?;
    tokio::fs::write(node_dir.join(if running { "RUNNING" } else { "STOPPED" }), "").await?;

    if running {
        let cib = shell::output_of(&shell::privileged("cibadmin -Ql")).await;
        if !cib.is_empty() {
            tokio::fs::write(node_dir.join("cib.xml"), cib).await?;
        }
    } else {
        let on_disk = env.cib_dir.join("cib.xml");
        if on_disk.is_file() {
            tokio::fs::copy(&on_disk, node_dir.join("cib.xml")).await?;
        } else {
            warn!("no CIB found at {}", on_disk.display());
        }
    }

    // The DC sentinel marks the node the scheduler runs on.
    let dc_re = Regex::new(r"Current DC:\s+(\S+)").expect("static regex");
    if let Some(caps) = dc_re.captures(&mon.stdout) {
        if nodes::is_local(&caps[1]) {
            tokio::fs::write(node_dir.join("DC"), "").await?;
        }
    }

    let mut members = config.nodes.join("\n");
    members.push('\n');
    tokio::fs::write(node_dir.join("members.txt"), members).await?;

    let sbd = shell::output_of(&shell::privileged("sbd dump")).await;
    if !sbd.is_empty() {
        tokio::fs::write(node_dir.join("sbd.txt"), sbd).await?;
    }
    Ok(())
}

/// The journal, the primary log window and any extra logs.
async fn collect_logs(config: &ReportConfig, env: &ClusterEnv, node_dir: &Path) -> Result<()> {
    let journal = node_dir.join("journal.log");
    let since = format_epoch(config.from_time);
    let until = if config.to_time > 0.0 {
        format_epoch(config.to_time)
    } else {
        format_epoch(Local::now().timestamp() as f64)
    };
    let out = shell::output_of(&shell::privileged(&format!(
        "journalctl --no-pager --since '{since}' --until '{until}'"
    )))
    .await;
    if !out.is_empty() {
        tokio::fs::write(&journal, out).await?;
    }

    let log = resolve_primary_log(config, env, &journal);
    match log {
        Some(log) => {
            info!("extracting log window from {}", log.display());
            let window = logtime::dump_log_window(&log, config.from_time, config.to_time).await?;
            tokio::fs::write(node_dir.join("ha-log.txt"), window).await?;
            let mut inf = String::new();
            let _ = writeln!(inf, "source: {}", log.display());
            let _ = writeln!(inf, "from: {}", since);
            let _ = writeln!(inf, "to: {}", until);
            tokio::fs::write(node_dir.join("ha-log.info"), inf).await?;
        }
        None => {
            warn!("no cluster log found; collecting an empty ha-log.txt");
            tokio::fs::write(node_dir.join("ha-log.txt"), "").await?;
        }
    }

    for extra in &config.extra_logs {
        let path = PathBuf::from(extra);
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let window = logtime::dump_log_window(&path, config.from_time, config.to_time).await?;
        tokio::fs::write(node_dir.join(name), window).await?;
    }
    Ok(())
}

fn resolve_primary_log(
    config: &ReportConfig,
    env: &ClusterEnv,
    collected_journal: &Path,
) -> Option<PathBuf> {
    if !config.ha_log.is_empty() {
        let path = PathBuf::from(&config.ha_log);
        if path.is_file() {
            return Some(path);
        }
        warn!("log file {} does not exist on this node", config.ha_log);
    }
    env.find_log(&config.extra_logs, &config.pcmk_log, collected_journal)
}

/// Scheduler inputs, core backtraces and the corosync blackbox; the expensive
/// parts honor the skip level.
async fn collect_state_dumps(
    config: &ReportConfig,
    env: &ClusterEnv,
    node_dir: &Path,
) -> Result<()> {
    if config.skip_lvl >= 1 {
        debug!("skip level {}: not collecting PE inputs or backtraces", config.skip_lvl);
        return Ok(());
    }

    let pengine = node_dir.join("pengine");
    let mut copied = 0usize;
    if env.pe_state_dir.is_dir() {
        tokio::fs::create_dir_all(&pengine).await?;
        let mut entries = tokio::fs::read_dir(&env.pe_state_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !path.is_file() || !entry.file_name().to_string_lossy().starts_with("pe-") {
                continue;
            }
            if !mtime_in_window(&path, config.from_time, config.to_time) {
                continue;
            }
            if let Some(name) = path.file_name() {
                tokio::fs::copy(&path, pengine.join(name)).await?;
                copied += 1;
            }
        }
    }
    debug!("copied {} scheduler input files", copied);

    let mut backtraces = String::new();
    for cores_dir in &env.cores_dirs {
        for core in find_cores(cores_dir) {
            let _ = writeln!(backtraces, "##### Core {} #####", core.display());
            if shell::has_command("gdb") {
                backtraces.push_str(
                    &shell::output_of(&shell::privileged(&format!(
                        "gdb --batch -ex 'thread apply all bt full' -c {}",
                        core.display()
                    )))
                    .await,
                );
            } else {
                backtraces.push_str("gdb not found: cannot create backtrace\n");
            }
        }
    }
    if !backtraces.is_empty() {
        tokio::fs::write(node_dir.join("backtraces.txt"), backtraces).await?;
    }

    if shell::has_command("corosync-blackbox") {
        let blackbox = shell::output_of(&shell::privileged("corosync-blackbox")).await;
        if !blackbox.is_empty() {
            tokio::fs::write(node_dir.join("blackbox.txt"), blackbox).await?;
        }
    }
    Ok(())
}

/// Configuration snapshot plus the permissions audit of the state dirs.
async fn collect_config_snapshot(env: &ClusterEnv, node_dir: &Path) -> Result<()> {
    let corosync_conf = Path::new("/etc/corosync/corosync.conf");
    if corosync_conf.is_file() {
        tokio::fs::copy(corosync_conf, node_dir.join("corosync.conf")).await?;
    }

    // check_permissions prints to stdout; scope-redirect it into the report.
    let out_path = node_dir.join("permissions.txt");
    let env = env.clone();
    tokio::task::spawn_blocking(move || -> Result<()> {
        let file = std::fs::File::create(&out_path)?;
        let _guard = StdioRedirect::stdout_to(&file)?;
        check_permissions(&env);
        Ok(())
    })
    .await
    .map_err(|e| ReportError::Internal(format!("permissions task failed: {e}")))??;
    Ok(())
}

/// Audits ownership and mode of the cluster state directories. Writes to
/// stdout; the caller decides where stdout points.
fn check_permissions(env: &ClusterEnv) {
    for dir in [&env.cib_dir, &env.pe_state_dir] {
        match std::fs::metadata(dir) {
            Ok(meta) => {
                let mode = meta.mode() & 0o777;
                if mode == 0o750 {
                    println!("{}: OK (mode {:o}, uid {}, gid {})", dir.display(), mode, meta.uid(), meta.gid());
                } else {
                    println!(
                        "{}: WRONG PERMISSIONS (mode {:o}, expected 750; uid {}, gid {})",
                        dir.display(),
                        mode,
                        meta.uid(),
                        meta.gid()
                    );
                }
            }
            Err(e) => println!("{}: cannot stat: {}", dir.display(), e),
        }
    }
}

fn find_cores(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| {
            p.is_file()
                && p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with("core"))
        })
        .collect()
}

fn mtime_in_window(path: &Path, from: f64, to: f64) -> bool {
    let Ok(meta) = std::fs::metadata(path) else {
        return false;
    };
    let Ok(modified) = meta.modified() else {
        return false;
    };
    let Ok(epoch) = modified.duration_since(UNIX_EPOCH) else {
        return false;
    };
    let mtime = epoch.as_secs_f64();
    mtime >= from && (to <= 0.0 || mtime <= to)
}

/// Formats an epoch for journalctl and the provenance header.
pub fn format_epoch(epoch: f64) -> String {
    let time = UNIX_EPOCH + Duration::from_secs_f64(epoch.max(0.0));
    DateTime::<Local>::from(time)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}
