// src/core/nodes.rs

//! Resolution of the cluster node table.
//!
//! Precedence: node names supplied on the command line win outright; next a
//! live cluster query; finally, with the cluster stopped, the node entries of
//! the on-disk CIB. An empty result is fatal on the master.

use crate::config::ReportConfig;
use crate::core::errors::{ReportError, Result};
use crate::core::probe::ClusterEnv;
use crate::core::utils::shell;
use regex::Regex;
use tracing::{debug, warn};

/// Resolves the ordered node table.
pub async fn discover_nodes(config: &ReportConfig, env: &ClusterEnv) -> Result<Vec<String>> {
    if !config.user_nodes.is_empty() {
        debug!("using user-supplied node list: {:?}", config.user_nodes);
        return Ok(config.user_nodes.clone());
    }

    let live = live_cluster_nodes().await;
    if !live.is_empty() {
        debug!("node list from live cluster: {:?}", live);
        return Ok(live);
    }

    let from_cib = cib_nodes(env);
    if !from_cib.is_empty() {
        debug!("node list from on-disk CIB: {:?}", from_cib);
        return Ok(from_cib);
    }

    Err(ReportError::NoNodes)
}

/// Queries the membership of a running cluster. Empty when the stack is down.
async fn live_cluster_nodes() -> Vec<String> {
    let out = shell::output_of("crm_node -l").await;
    let mut nodes: Vec<String> = out
        .lines()
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            match fields.as_slice() {
                // "<id> <uname> <state>" from a running pacemaker
                [_, name, state, ..] if *state != "lost" => Some(name.to_string()),
                [name] => Some(name.to_string()),
                _ => None,
            }
        })
        .collect();
    nodes.sort();
    nodes.dedup();
    nodes
}

/// Falls back to the `uname` attributes of the node section in the CIB.
fn cib_nodes(env: &ClusterEnv) -> Vec<String> {
    let cib = env.cib_dir.join("cib.xml");
    let Ok(contents) = std::fs::read_to_string(&cib) else {
        warn!("cannot read {}", cib.display());
        return Vec::new();
    };
    let re = Regex::new(r#"uname="([^"]+)""#).expect("static regex");
    let mut nodes: Vec<String> = re
        .captures_iter(&contents)
        .map(|c| c[1].to_string())
        .collect();
    nodes.sort();
    nodes.dedup();
    nodes
}

/// The name this host goes by in the cluster.
pub fn local_hostname() -> String {
    whoami::fallible::hostname().unwrap_or_else(|_| "localhost".to_string())
}

/// Whether `node` refers to this host.
pub fn is_local(node: &str) -> bool {
    let hostname = local_hostname();
    node == hostname
        || node == "localhost"
        || hostname
            .split('.')
            .next()
            .is_some_and(|short| short == node)
}
