// src/core/master/analysis.rs

//! The analysis pass over the assembled report tree: a pattern scan of every
//! node's extracted log, and a merged event timeline. Both run as concurrent
//! workers after all collectors have delivered.

use crate::core::errors::Result;
use crate::core::logtime::stamp;
use crate::core::utils::grep::{self, GrepFlags};
use std::fmt::Write as _;
use std::path::Path;
use tracing::debug;

/// Log lines worth a place on the cluster timeline.
const EVENT_PATTERNS: &[&str] = &[
    "membership",
    "quorum",
    "Fencing",
    "shoot",
    "monitor",
    "unclean",
    "new_status",
    "Corosync.*(started|stopped)",
    "pacemakerd.*(started|stopped)",
];

/// Greps each node's log for the configured analysis patterns and writes
/// `analysis.txt` at the report root, plus a CIB consistency note.
pub async fn write_analysis(report_root: &Path, nodes: &[String], patterns: &[String]) -> Result<()> {
    let mut out = String::new();

    for pattern in patterns {
        let _ = writeln!(out, "##### Matches for `{pattern}` #####");
        for node in nodes {
            let log = report_root.join(node).join("ha-log.txt");
            if !log.is_file() {
                continue;
            }
            let hits = grep::grep_path(pattern, &log, GrepFlags::empty())?;
            if hits.is_empty() {
                continue;
            }
            let _ = writeln!(out, "--- {node} ---");
            for hit in hits {
                let _ = writeln!(out, "{hit}");
            }
        }
        out.push('\n');
    }

    out.push_str(&cib_consistency_note(report_root, nodes));
    tokio::fs::write(report_root.join("analysis.txt"), out).await?;
    debug!("analysis written");
    Ok(())
}

/// Nodes running one cluster must agree on the CIB; flag any divergence.
fn cib_consistency_note(report_root: &Path, nodes: &[String]) -> String {
    let mut first: Option<(String, Vec<u8>)> = None;
    let mut note = String::from("##### CIB consistency #####\n");
    let mut diverged = false;
    for node in nodes {
        let cib = report_root.join(node).join("cib.xml");
        let Ok(contents) = std::fs::read(&cib) else {
            let _ = writeln!(note, "{node}: no cib.xml collected");
            continue;
        };
        match &first {
            None => first = Some((node.clone(), contents)),
            Some((first_node, first_contents)) => {
                if *first_contents != contents {
                    let _ = writeln!(note, "WARNING: cib.xml differs between {first_node} and {node}");
                    diverged = true;
                }
            }
        }
    }
    if !diverged && first.is_some() {
        note.push_str("OK: cib.xml is identical on all nodes that delivered one\n");
    }
    note
}

/// Builds the merged event timeline across all nodes, ordered by timestamp
/// where one can be parsed, and writes `events.txt` at the report root.
pub async fn write_events(report_root: &Path, nodes: &[String]) -> Result<()> {
    let mut events: Vec<(Option<f64>, String)> = Vec::new();
    let pattern = EVENT_PATTERNS.join("|");

    for node in nodes {
        let log = report_root.join(node).join("ha-log.txt");
        if !log.is_file() {
            continue;
        }
        for line in grep::grep_path(&pattern, &log, GrepFlags::IGNORE_CASE)? {
            let ts = stamp::detect_line_format(&line).and_then(|fmt| stamp::get_ts(&line, fmt));
            events.push((ts, format!("{node}: {line}")));
        }
    }

    // Stamped events in order, unstampable ones at the end, original order.
    events.sort_by(|a, b| match (a.0, b.0) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(std::cmp::Ordering::Equal),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });

    let mut out = String::new();
    for (_, line) in events {
        let _ = writeln!(out, "{line}");
    }
    tokio::fs::write(report_root.join("events.txt"), out).await?;
    debug!("event timeline written");
    Ok(())
}
