// src/core/master/ssh.rs

//! Remote-shell negotiation and the per-node collector fan-out.
//!
//! Login candidates are tried in a fixed order until one works; the first
//! success fixes the user for the remaining nodes. Nodes that only accept
//! password logins are recorded and skipped: the fan-out must stay fully
//! non-interactive.

use crate::config::{COLLECTOR_SENTINEL, ReportConfig};
use crate::core::errors::{ReportError, Result};
use crate::core::nodes;
use crate::core::utils::{shell, tarball};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{info, warn};

/// Users tried for passwordless login when `-u` is not given. The empty
/// string means "whatever ssh defaults to for this host".
const CANDIDATE_USERS: &[&str] = &["", "root", "hacluster"];

/// A login probe that needs longer than this is as good as failed.
const LOGIN_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// The outcome of remote-shell negotiation.
#[derive(Debug, Clone)]
pub struct SshPlan {
    /// The user fixed for all remote logins; `None` is the ssh default.
    pub user: Option<String>,
    /// Nodes that never accepted a batch-mode login.
    pub password_required: HashSet<String>,
}

impl SshPlan {
    /// Whether remote commands need a `sudo -u root` prefix.
    pub fn needs_sudo(&self) -> bool {
        self.effective_user() != "root"
    }

    fn effective_user(&self) -> String {
        self.user
            .clone()
            .filter(|u| !u.is_empty())
            .unwrap_or_else(whoami::username)
    }

    fn target(&self, node: &str) -> String {
        match self.user.as_deref() {
            Some(user) if !user.is_empty() => format!("{user}@{node}"),
            _ => node.to_string(),
        }
    }
}

/// Probes every non-local node for a passwordless login.
pub async fn negotiate(config: &ReportConfig) -> SshPlan {
    let mut fixed: Option<String> = config.ssh_user.clone();
    let mut password_required = HashSet::new();

    for node in &config.nodes {
        if nodes::is_local(node) {
            continue;
        }
        let candidates: Vec<String> = match &fixed {
            Some(user) => vec![user.clone()],
            None => CANDIDATE_USERS.iter().map(|u| u.to_string()).collect(),
        };
        let mut logged_in = false;
        for user in candidates {
            if try_login(node, &user, &config.ssh_opts).await {
                info!(
                    "ssh to {} works{}",
                    node,
                    if user.is_empty() { String::new() } else { format!(" as {user}") }
                );
                fixed = Some(user);
                logged_in = true;
                break;
            }
        }
        if !logged_in {
            warn!("passwordless ssh to {} does not work; skipping it", node);
            password_required.insert(node.clone());
        }
    }

    SshPlan {
        user: fixed,
        password_required,
    }
}

async fn try_login(node: &str, user: &str, ssh_opts: &[String]) -> bool {
    let target = if user.is_empty() {
        node.to_string()
    } else {
        format!("{user}@{node}")
    };
    let mut args: Vec<String> = vec!["-T".into(), "-o".into(), "BatchMode=yes".into()];
    args.extend(ssh_opts.iter().cloned());
    args.push(target);
    args.push("true".into());
    let line = format!("ssh {}", shell_words::join(&args));
    shell::run_line_with_timeout(&line, LOGIN_PROBE_TIMEOUT)
        .await
        .success()
}

/// Spawns one collector per reachable peer and splices each tar stream into
/// `report_root`. Peer failures abort only that node's extraction.
pub async fn fan_out(config: &ReportConfig, plan: &SshPlan, report_root: &Path) {
    let mut tasks: JoinSet<(String, Result<()>)> = JoinSet::new();

    for node in &config.nodes {
        if nodes::is_local(node) || plan.password_required.contains(node) {
            continue;
        }
        let node = node.clone();
        let plan = plan.clone();
        let ssh_opts = config.ssh_opts.clone();
        let env_string = config.to_env_string();
        let root = report_root.to_path_buf();
        tasks.spawn(async move {
            let res = collect_peer(&node, &plan, &ssh_opts, &env_string, &root).await;
            (node, res)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((node, Ok(()))) => info!("collected report from {}", node),
            Ok((node, Err(e))) => warn!("could not collect report from {}: {}", node, e),
            Err(e) => warn!("collector task panicked: {}", e),
        }
    }
}

/// Runs one remote collector and extracts its stdout tar stream under
/// `report_root`, so the peer's tree lands as a sibling of the local one.
async fn collect_peer(
    node: &str,
    plan: &SshPlan,
    ssh_opts: &[String],
    env_string: &str,
    report_root: &Path,
) -> Result<()> {
    let sudo = if plan.needs_sudo() { "sudo -u root " } else { "" };
    let remote_cmd = format!("{}{} {} {}", sudo, remote_binary(), COLLECTOR_SENTINEL, env_string);

    let mut args: Vec<String> = vec!["-T".into(), "-o".into(), "BatchMode=yes".into()];
    args.extend(ssh_opts.iter().cloned());
    args.push(plan.target(node));
    args.push(remote_cmd);

    let node = node.to_string();
    let root = report_root.to_path_buf();
    tokio::task::spawn_blocking(move || -> Result<()> {
        let mut child = std::process::Command::new("ssh")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .spawn()?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ReportError::Internal("no stdout from ssh child".into()))?;
        let extracted = tarball::extract_stream(stdout, &root);
        let status = child.wait()?;
        if !status.success() {
            return Err(ReportError::SshFailed(node));
        }
        extracted?;
        Ok(())
    })
    .await
    .map_err(|e| ReportError::Internal(format!("fan-out task failed: {e}")))?
}

/// The collector is this same binary, resolved by name on the peer's PATH.
fn remote_binary() -> String {
    std::env::args()
        .next()
        .map(PathBuf::from)
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "hbreport".to_string())
}
