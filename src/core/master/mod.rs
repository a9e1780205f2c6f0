// src/core/master/mod.rs

//! The master role: orchestrates the whole report run.
//!
//! Phases run strictly in order: environment probe, node discovery,
//! remote-shell negotiation, privilege resolution, inline local collection,
//! concurrent peer fan-out, concurrent analysis, packaging. Per-node
//! transport failures degrade to warnings; the report ships with whatever
//! arrived.

pub mod analysis;
pub mod package;
pub mod ssh;

use crate::config::ReportConfig;
use crate::core::collector;
use crate::core::errors::{ReportError, Result};
use crate::core::nodes;
use crate::core::probe::ClusterEnv;
use crate::core::utils::{shell, tempfiles};
use std::fmt::Write as _;
use std::io::IsTerminal;
use std::path::Path;
use tokio::task::JoinSet;
use tracing::{info, warn};

/// Runs the master role to completion.
pub async fn run(mut config: ReportConfig) -> Result<()> {
    // Phase 1: probe the cluster layout.
    let env = ClusterEnv::probe()?;

    // Phase 2: resolve the node table.
    config.nodes = nodes::discover_nodes(&config, &env).await?;
    info!("nodes to collect from: {}", config.nodes.join(" "));

    prepare_destination(&config).await?;
    let work_parent = tempfiles::create_work_dir()?;
    let report_root = work_parent.join(&config.dest);
    tokio::fs::create_dir_all(&report_root).await?;

    // Phases 3 and 4: remote-shell negotiation and privilege resolution.
    let plan = if config.single_node {
        ssh::SshPlan {
            user: config.ssh_user.clone(),
            password_required: Default::default(),
        }
    } else {
        ssh::negotiate(&config).await
    };

    // Phase 5: collect this node inline when it is a member.
    if let Some(local) = config.nodes.iter().find(|n| nodes::is_local(n)).cloned() {
        let node_dir = report_root.join(&local);
        tokio::fs::create_dir_all(&node_dir).await?;
        match collector::collect_node(&config, &env, &node_dir).await {
            Ok(()) => {}
            Err(e @ (ReportError::DiskFull(_) | ReportError::TempFile(_))) => return Err(e),
            Err(e) => warn!("local collection failed: {}", e),
        }
    }

    // Phase 6: fan out to the peers.
    if !config.single_node {
        ssh::fan_out(&config, &plan, &report_root).await;
    }

    // Phase 7: analysis workers, overlapping with the description prompt.
    let mut workers: JoinSet<Result<()>> = JoinSet::new();
    {
        let root = report_root.clone();
        let node_list = config.nodes.clone();
        let patterns = config.analysis_patterns.clone();
        workers.spawn(async move { analysis::write_analysis(&root, &node_list, &patterns).await });
    }
    {
        let root = report_root.clone();
        let node_list = config.nodes.clone();
        workers.spawn(async move { analysis::write_events(&root, &node_list).await });
    }
    write_description(&config, &report_root).await?;
    while let Some(joined) = workers.join_next().await {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("analysis worker failed: {}", e),
            Err(e) => warn!("analysis worker panicked: {}", e),
        }
    }

    // Phase 8: package and announce.
    let final_path = package::package(&config, &work_parent).await?;
    println!("The report is saved in {}", final_path.display());
    Ok(())
}

/// An existing destination is refused unless `-Z` asked for its removal.
async fn prepare_destination(config: &ReportConfig) -> Result<()> {
    let dest = config.dest_dir.join(&config.dest);
    if dest.exists() {
        if config.force_remove {
            info!("removing existing destination {}", dest.display());
            if dest.is_dir() {
                tokio::fs::remove_dir_all(&dest).await?;
            } else {
                tokio::fs::remove_file(&dest).await?;
            }
        } else {
            return Err(ReportError::DestinationExists(dest));
        }
    }
    Ok(())
}

/// Writes the report header and, unless suppressed, lets the user describe
/// the problem in their editor.
async fn write_description(config: &ReportConfig, report_root: &Path) -> Result<()> {
    let path = report_root.join("description.txt");
    let mut header = String::new();
    let _ = writeln!(header, "Report: {}", config.dest);
    let _ = writeln!(header, "Generated: {}", collector::format_epoch(chrono::Local::now().timestamp() as f64));
    let _ = writeln!(header, "From: {}", collector::format_epoch(config.from_time));
    let _ = writeln!(
        header,
        "To: {}",
        if config.to_time > 0.0 {
            collector::format_epoch(config.to_time)
        } else {
            "now".to_string()
        }
    );
    let _ = writeln!(header, "Nodes: {}", config.nodes.join(" "));
    let _ = writeln!(header, "\nPlease describe the problem below this line.\n");
    tokio::fs::write(&path, header).await?;

    if config.no_description || !std::io::stdin().is_terminal() {
        return Ok(());
    }
    let editor = config
        .editor
        .clone()
        .or_else(|| std::env::var("EDITOR").ok())
        .unwrap_or_else(|| "vi".to_string());
    if !shell::has_command(&editor) {
        warn!("editor {} not found; leaving description empty", editor);
        return Ok(());
    }
    let status = tokio::process::Command::new(&editor)
        .arg(&path)
        .status()
        .await?;
    if !status.success() {
        warn!("editor {} exited with {}", editor, status);
    }
    Ok(())
}
