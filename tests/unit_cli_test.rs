// tests/unit_cli_test.rs

use clap::Parser;
use hbreport::cli::{Cli, parse_time};

fn parse(args: &[&str]) -> Cli {
    let mut argv = vec!["hbreport"];
    argv.extend_from_slice(args);
    Cli::try_parse_from(argv).unwrap()
}

#[test]
fn test_minimal_invocation() {
    let config = parse(&["-f", "2020-01-01 10:00"]).into_config().unwrap();
    assert!(config.from_time > 0.0);
    assert_eq!(config.to_time, 0.0);
    assert!(config.dest.starts_with("hb_report-"));
    assert_eq!(config.extra_logs, vec!["/var/log/messages".to_string()]);
    assert_eq!(config.sanitize_patterns, vec!["passw.*".to_string()]);
}

#[test]
fn test_nodes_option_is_additive() {
    let config = parse(&["-f", "2020-01-01 10:00", "-n", "a b", "-n", "c"])
        .into_config()
        .unwrap();
    assert_eq!(config.user_nodes, vec!["a", "b", "c"]);
}

#[test]
fn test_patterns_append_to_defaults() {
    let config = parse(&["-f", "2020-01-01 10:00", "-p", "usern.*", "-L", "WARN:"])
        .into_config()
        .unwrap();
    assert_eq!(config.sanitize_patterns, vec!["passw.*", "usern.*"]);
    assert_eq!(config.analysis_patterns, vec!["CRIT:", "ERROR:", "WARN:"]);
}

#[test]
fn test_no_extra_logs_empties_then_appends() {
    let config = parse(&["-f", "2020-01-01 10:00", "-M", "-E", "/var/log/syslog"])
        .into_config()
        .unwrap();
    assert_eq!(config.extra_logs, vec!["/var/log/syslog"]);
}

#[test]
fn test_flag_mapping() {
    let config = parse(&["-f", "2020-01-01 10:00", "-Q", "-s", "-d", "-S", "-D", "-Z", "-v", "-v"])
        .into_config()
        .unwrap();
    assert_eq!(config.skip_lvl, 1);
    assert!(config.do_sanitize);
    assert!(config.no_compress);
    assert!(config.single_node);
    assert!(config.no_description);
    assert!(config.force_remove);
    assert_eq!(config.verbosity, 2);
}

#[test]
fn test_dest_with_path_splits() {
    let config = parse(&["-f", "2020-01-01 10:00", "/tmp/report_5"])
        .into_config()
        .unwrap();
    assert_eq!(config.dest, "report_5");
    assert_eq!(config.dest_dir, std::path::PathBuf::from("/tmp"));
}

#[test]
fn test_window_order_is_enforced() {
    let result = parse(&["-f", "2020-01-02 10:00", "-t", "2020-01-01 10:00"]).into_config();
    assert!(result.is_err());
}

#[test]
fn test_missing_from_is_an_error() {
    let result = parse(&["-t", "2020-01-01 10:00"]).into_config();
    assert!(result.is_err());
}

#[test]
fn test_time_formats() {
    assert!(parse_time("2007/9/5 12:30").is_ok());
    assert!(parse_time("09-Sep-07 2:00").is_ok());
    assert!(parse_time("1:00").is_ok());
    assert!(parse_time("2pm").is_ok());
    assert!(parse_time("18:00").is_ok());
    assert!(parse_time("not a time").is_err());
}

#[test]
fn test_time_ordering_within_day() {
    let morning = parse_time("2020-03-01 08:00").unwrap();
    let evening = parse_time("2020-03-01 20:00").unwrap();
    assert!(morning < evening);
    assert_eq!(evening - morning, 12.0 * 3600.0);
}
