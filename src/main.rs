// src/main.rs

//! The main entry point for the hbreport binary.
//!
//! One executable carries both roles: invoked plainly it is the master that
//! orchestrates the whole report; invoked with the `__slave` sentinel as the
//! first positional argument it is a collector spawned by a master over the
//! remote shell. The sentinel is only tested when a positional argument is
//! present, so a bare invocation is an (invalid) master run, not a crash.

use anyhow::Result;
use clap::Parser;
use hbreport::cli::{Cli, USAGE};
use hbreport::config::COLLECTOR_SENTINEL;
use hbreport::core::utils::tempfiles;
use hbreport::core::{collector, master};
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    run_app().await
}

async fn run_app() -> Result<()> {
    const VERSION: &str = env!("CARGO_PKG_VERSION");

    let args: Vec<String> = env::args().collect();

    if args.len() > 1 && args[1] == COLLECTOR_SENTINEL {
        // --- Collector mode ---
        let tokens = &args[2..];
        let verbosity = tokens
            .iter()
            .find_map(|t| t.strip_prefix("VERBOSITY="))
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        init_tracing(verbosity);

        if let Err(e) = tempfiles::init() {
            eprintln!("hbreport: {e}");
            std::process::exit(1);
        }
        let result = collector::run(tokens).await;
        tempfiles::cleanup();
        if let Err(e) = result {
            eprintln!("hbreport: {e}");
            std::process::exit(1);
        }
        return Ok(());
    }

    // --- Master mode ---
    if args.len() == 1 {
        eprint!("{USAGE}");
        std::process::exit(1);
    }
    let cli = match Cli::try_parse_from(&args) {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("hbreport: {e}");
            eprint!("{USAGE}");
            std::process::exit(1);
        }
    };
    if cli.help {
        eprint!("{USAGE}");
        std::process::exit(1);
    }
    if cli.version {
        println!("hbreport {VERSION}");
        return Ok(());
    }

    init_tracing(u32::from(cli.verbose));

    let config = match cli.into_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("hbreport: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = tempfiles::init() {
        eprintln!("hbreport: {e}");
        std::process::exit(1);
    }
    let result = master::run(config).await;
    tempfiles::cleanup();
    if let Err(e) = result {
        eprintln!("hbreport: {e}");
        std::process::exit(1);
    }
    Ok(())
}

/// Diagnostics always go to stderr: a collector's stdout carries the tar
/// stream. `RUST_LOG` overrides the `-v` mapping.
fn init_tracing(verbosity: u32) {
    let default_level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("hbreport={default_level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .with_ansi(false)
        .init();
}
