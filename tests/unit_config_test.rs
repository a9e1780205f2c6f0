// tests/unit_config_test.rs

use hbreport::config::{ReportConfig, default_report_name, is_safe_name};
use hbreport::core::nodes;
use hbreport::core::probe::ClusterEnv;
use std::path::PathBuf;

fn sample_config() -> ReportConfig {
    ReportConfig {
        dest: "report_1".into(),
        from_time: 1_485_400_000.0,
        to_time: 1_485_403_600.0,
        user_nodes: vec!["a".into(), "b".into()],
        nodes: vec!["a".into(), "b".into()],
        ha_log: "/var/log/cluster/ha.log".into(),
        sanitize_patterns: vec!["passw.*".into(), "usern.*".into()],
        do_sanitize: true,
        skip_lvl: 1,
        extra_logs: vec!["/var/log/messages".into()],
        pcmk_log: "/var/log/pacemaker.log".into(),
        verbosity: 2,
        ..ReportConfig::default()
    }
}

#[test]
fn test_env_string_round_trip() {
    let config = sample_config();
    let env = config.to_env_string();

    // The wire format is shell words; a remote shell will split it the same
    // way before the collector sees the tokens.
    let tokens = shell_words::split(&env).unwrap();
    let parsed = ReportConfig::from_env_tokens(&tokens).unwrap();

    assert_eq!(parsed.dest, config.dest);
    assert_eq!(parsed.from_time, config.from_time);
    assert_eq!(parsed.to_time, config.to_time);
    assert_eq!(parsed.user_nodes, config.user_nodes);
    assert_eq!(parsed.nodes, config.nodes);
    assert_eq!(parsed.ha_log, config.ha_log);
    assert_eq!(parsed.do_sanitize, config.do_sanitize);
    assert_eq!(parsed.skip_lvl, config.skip_lvl);
    assert_eq!(parsed.extra_logs, config.extra_logs);
    assert_eq!(parsed.pcmk_log, config.pcmk_log);
    assert_eq!(parsed.verbosity, config.verbosity);
}

#[test]
fn test_all_keys_always_present() {
    let env = ReportConfig {
        from_time: 1.0,
        ..ReportConfig::default()
    }
    .to_env_string();
    for key in [
        "DEST", "FROM_TIME", "TO_TIME", "USER_NODES", "NODES", "HA_LOG", "SANITIZE",
        "DO_SANITIZE", "SKIP_LVL", "EXTRA_LOGS", "PCMK_LOG", "VERBOSITY",
    ] {
        assert!(env.contains(&format!("{key}=")), "missing key {key}");
    }
}

#[test]
fn test_malformed_token_is_rejected() {
    let tokens = vec!["NOT_A_PAIR".to_string()];
    assert!(ReportConfig::from_env_tokens(&tokens).is_err());
}

#[test]
fn test_window_invariant() {
    let mut config = ReportConfig::default();
    assert!(config.validate_window().is_err());
    config.from_time = 100.0;
    assert!(config.validate_window().is_ok());
    config.to_time = 50.0;
    assert!(config.validate_window().is_err());
    config.to_time = 200.0;
    assert!(config.validate_window().is_ok());
}

#[test]
fn test_safe_names() {
    assert!(is_safe_name("report_1"));
    assert!(is_safe_name(&default_report_name()));
    assert!(!is_safe_name("../escape"));
    assert!(!is_safe_name("a/b"));
    assert!(!is_safe_name(""));
    assert!(!is_safe_name("."));
}

#[test]
fn test_default_report_name_shape() {
    let name = default_report_name();
    assert!(name.starts_with("hb_report-"));
    // weekday-dd-mm-yyyy
    assert_eq!(name.split('-').count(), 5);
}

#[tokio::test]
async fn test_user_nodes_take_precedence() {
    let env = ClusterEnv {
        ocf_dir: PathBuf::from("/nonexistent"),
        ha_varlib: PathBuf::from("/nonexistent"),
        ha_bin: PathBuf::from("/nonexistent"),
        crm_daemon_dir: PathBuf::from("/nonexistent"),
        pe_state_dir: PathBuf::from("/nonexistent"),
        cib_dir: PathBuf::from("/nonexistent"),
        pcmk_lib: PathBuf::from("/nonexistent"),
        cores_dirs: vec![],
        loglevel: "info".into(),
        corosync_logfile: None,
        syslog_facility: "daemon".into(),
    };
    let config = ReportConfig {
        from_time: 1.0,
        user_nodes: vec!["a".into(), "b".into()],
        ..ReportConfig::default()
    };
    // Even if a live cluster reported {a, c}, the user list wins.
    let resolved = nodes::discover_nodes(&config, &env).await.unwrap();
    assert_eq!(resolved, vec!["a".to_string(), "b".to_string()]);
}
