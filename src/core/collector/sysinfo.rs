// src/core/collector/sysinfo.rs

//! Host facts and live statistics for the per-node report.
//!
//! `sysinfo.txt` holds the static platform description plus cluster tool
//! versions; `sysstats.txt` the state of the host at collection time. Both
//! degrade field by field: a missing tool leaves an empty section.

use crate::core::errors::Result;
use crate::core::utils::shell;
use std::fmt::Write as _;
use std::path::Path;
use std::time::Duration;
use sysinfo::System;

/// Commands whose versions belong in the platform description.
const VERSION_CMDS: &[&str] = &[
    "crm_mon --version",
    "cibadmin --version",
    "corosync -v",
];

/// Guard for commands that can hang on dead network mounts.
const DF_TIMEOUT: Duration = Duration::from_secs(5);

/// Writes the static platform description.
pub async fn write_sysinfo(path: &Path) -> Result<()> {
    let mut out = String::new();

    let _ = writeln!(out, "##### System info #####");
    let _ = writeln!(
        out,
        "Platform: {} {}",
        System::name().unwrap_or_default(),
        System::os_version().unwrap_or_default()
    );
    let _ = writeln!(
        out,
        "Kernel release: {}",
        System::kernel_version().unwrap_or_default()
    );
    let _ = writeln!(
        out,
        "Architecture: {}",
        System::cpu_arch()
    );

    let sys = System::new_all();
    if let Some(cpu) = sys.cpus().first() {
        let _ = writeln!(out, "CPU: {} x{}", cpu.brand(), sys.cpus().len());
    }
    let _ = writeln!(out, "Total memory: {} kB", sys.total_memory() / 1024);

    let _ = writeln!(out, "\n##### Versions #####");
    for cmd in VERSION_CMDS {
        out.push_str(&shell::output_of(cmd).await);
    }

    tokio::fs::write(path, out).await?;
    Ok(())
}

/// Writes the live host statistics.
pub async fn write_sysstats(path: &Path) -> Result<()> {
    let mut out = String::new();

    let _ = writeln!(out, "##### Uptime #####");
    let _ = writeln!(out, "{} seconds", System::uptime());
    let load = System::load_average();
    let _ = writeln!(out, "load average: {:.2} {:.2} {:.2}", load.one, load.five, load.fifteen);

    let sys = System::new_all();
    let _ = writeln!(out, "\n##### Memory #####");
    let _ = writeln!(out, "total: {} kB", sys.total_memory() / 1024);
    let _ = writeln!(out, "used: {} kB", sys.used_memory() / 1024);
    let _ = writeln!(out, "swap total: {} kB", sys.total_swap() / 1024);
    let _ = writeln!(out, "swap used: {} kB", sys.used_swap() / 1024);

    let _ = writeln!(out, "\n##### Processes #####");
    let mut procs: Vec<_> = sys.processes().values().collect();
    procs.sort_by_key(|p| p.pid());
    for proc in procs {
        let _ = writeln!(
            out,
            "{:>8} {:>10} kB {}",
            proc.pid(),
            proc.memory() / 1024,
            proc.name().to_string_lossy()
        );
    }

    // df talks to every mounted filesystem and is the classic hang.
    let _ = writeln!(out, "\n##### Disk usage #####");
    out.push_str(&shell::run_line_with_timeout("df -h", DF_TIMEOUT).await.stdout);

    tokio::fs::write(path, out).await?;
    Ok(())
}
