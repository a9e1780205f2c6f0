// src/cli.rs

//! Command-line surface of the master role.
//!
//! The option set is short-only, getopt style. Help and version bypass clap's
//! built-in handling so the exit codes match the documented contract: `-h`
//! prints usage and exits 1, `-V` prints the version and exits 0.

use crate::config::ReportConfig;
use crate::core::errors::{ReportError, Result};
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use clap::{ArgAction, Parser};
use std::path::Path;

pub const USAGE: &str = "\
usage: hbreport -f {time} [-t time]
       [-u user] [-X ssh-options] [-l file] [-n nodes] [-E files]
       [-p patt] [-L patt] [-e prog] [-MSDZQVsvhd] [dest]

        -f time: time to start from
        -t time: time to finish at (dflt: now)
        -d     : don't compress, but leave result in a directory
        -n nodes: node names for this cluster; this option is additive
                 (use either -n \"a b\" or -n a -n b)
        -u user: ssh user to access other nodes (dflt: empty, root, hacluster)
        -X ssh-options: extra ssh(1) options
        -l file: log file
        -E file: extra logs to collect; this option is additive
                 (dflt: /var/log/messages)
        -s     : sanitize the PE and CIB files
        -p patt: regular expression to match variables containing sensitive data;
                 this option is additive (dflt: \"passw.*\")
        -L patt: regular expression to match in log files for analysis;
                 this option is additive (dflt: CRIT: ERROR:)
        -e prog: your favourite editor
        -Q     : don't run resource intensive operations (speed up)
        -M     : don't collect extra logs (/var/log/messages)
        -D     : don't invoke editor to write description
        -Z     : if destination directories exist, remove them instead of exiting
        -S     : single node operation; don't try to start report
                 collectors on other nodes
        -v     : increase verbosity
        -V     : print version
        dest   : report name (may include path where to store the report)
";

#[derive(Debug, Parser)]
#[command(
    name = "hbreport",
    disable_help_flag = true,
    disable_version_flag = true
)]
pub struct Cli {
    #[arg(short = 'f', value_name = "TIME")]
    pub from: Option<String>,

    #[arg(short = 't', value_name = "TIME")]
    pub to: Option<String>,

    #[arg(short = 'u', value_name = "USER")]
    pub user: Option<String>,

    #[arg(short = 'X', value_name = "SSH_OPTS")]
    pub ssh_opts: Option<String>,

    #[arg(short = 'l', value_name = "FILE")]
    pub logfile: Option<String>,

    #[arg(short = 'n', value_name = "NODES", action = ArgAction::Append)]
    pub nodes: Vec<String>,

    #[arg(short = 'E', value_name = "FILE", action = ArgAction::Append)]
    pub extra_logs: Vec<String>,

    #[arg(short = 'p', value_name = "PATT", action = ArgAction::Append)]
    pub sanitize_patterns: Vec<String>,

    #[arg(short = 'L', value_name = "PATT", action = ArgAction::Append)]
    pub analysis_patterns: Vec<String>,

    #[arg(short = 'e', value_name = "PROG")]
    pub editor: Option<String>,

    #[arg(short = 'M')]
    pub no_extra_logs: bool,

    #[arg(short = 'S')]
    pub single_node: bool,

    #[arg(short = 'D')]
    pub no_description: bool,

    #[arg(short = 'Z')]
    pub force_remove: bool,

    #[arg(short = 'Q')]
    pub quick: bool,

    #[arg(short = 'V')]
    pub version: bool,

    #[arg(short = 's')]
    pub sanitize: bool,

    #[arg(short = 'v', action = ArgAction::Count)]
    pub verbose: u8,

    #[arg(short = 'h')]
    pub help: bool,

    #[arg(short = 'd')]
    pub no_compress: bool,

    pub dest: Option<String>,
}

impl Cli {
    /// Folds the parsed options into a validated [`ReportConfig`].
    pub fn into_config(self) -> Result<ReportConfig> {
        let mut config = ReportConfig::default();

        let from = self
            .from
            .ok_or_else(|| ReportError::BadTimeSpec("-f is required".into()))?;
        config.from_time = parse_time(&from)?;
        if let Some(to) = &self.to {
            config.to_time = parse_time(to)?;
        }
        config.validate_window()?;

        for chunk in &self.nodes {
            config
                .user_nodes
                .extend(chunk.split_whitespace().map(|s| s.to_string()));
        }
        if self.no_extra_logs {
            config.extra_logs.clear();
        }
        config.extra_logs.extend(self.extra_logs);
        config.sanitize_patterns.extend(self.sanitize_patterns);
        config.analysis_patterns.extend(self.analysis_patterns);

        if let Some(logfile) = self.logfile {
            config.ha_log = logfile;
        }
        if let Some(opts) = &self.ssh_opts {
            config.ssh_opts = shell_words::split(opts)?;
        }
        config.ssh_user = self.user;
        config.editor = self.editor;
        config.do_sanitize = self.sanitize;
        config.skip_lvl = u32::from(self.quick);
        config.verbosity = u32::from(self.verbose);
        config.no_compress = self.no_compress;
        config.single_node = self.single_node;
        config.no_description = self.no_description;
        config.force_remove = self.force_remove;

        if let Some(dest) = &self.dest {
            let path = Path::new(dest);
            config.dest = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default()
                .to_string();
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                config.dest_dir = parent.to_path_buf();
            }
        }
        config.validate_dest()?;
        Ok(config)
    }
}

/// Parses the `-f`/`-t` time specifications. Accepted shapes, tried in order:
/// full date-times, bare dates (midnight), bare clock times and am/pm hours
/// (today), and `dd-Mon-yy` support forms.
pub fn parse_time(spec: &str) -> Result<f64> {
    let spec = spec.trim();
    let today = Local::now().date_naive();

    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M:%S",
        "%Y/%m/%d %H:%M",
        "%d-%b-%y %H:%M:%S",
        "%d-%b-%y %H:%M",
    ];
    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d-%b-%y"];
    const TIME_FORMATS: &[&str] = &["%H:%M:%S", "%H:%M", "%I:%M%p"];

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(spec, fmt) {
            return to_epoch(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(spec, fmt) {
            return to_epoch(d.and_hms_opt(0, 0, 0).unwrap());
        }
    }
    for fmt in TIME_FORMATS {
        if let Ok(t) = NaiveTime::parse_from_str(spec, fmt) {
            return to_epoch(today.and_time(t));
        }
    }
    // Bare meridiem hours like "2pm" carry no minute, which the strftime
    // grammars refuse.
    let lower = spec.to_ascii_lowercase();
    if let Some(hour_str) = lower.strip_suffix("pm").or_else(|| lower.strip_suffix("am")) {
        if let Ok(hour) = hour_str.trim().parse::<u32>() {
            if (1..=12).contains(&hour) {
                let hour = match (lower.ends_with("pm"), hour) {
                    (true, 12) => 12,
                    (true, h) => h + 12,
                    (false, 12) => 0,
                    (false, h) => h,
                };
                if let Some(t) = NaiveTime::from_hms_opt(hour, 0, 0) {
                    return to_epoch(today.and_time(t));
                }
            }
        }
    }
    if let Ok(epoch) = spec.parse::<f64>() {
        if epoch > 0.0 {
            return Ok(epoch);
        }
    }
    Err(ReportError::BadTimeSpec(spec.to_string()))
}

fn to_epoch(dt: NaiveDateTime) -> Result<f64> {
    Local
        .from_local_datetime(&dt)
        .earliest()
        .map(|dt| dt.timestamp() as f64)
        .ok_or_else(|| ReportError::BadTimeSpec(dt.to_string()))
}
