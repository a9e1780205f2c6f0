// tests/unit_probe_test.rs

use hbreport::core::probe::ClusterEnv;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

/// Lays out a minimal cluster tree under `root`.
fn scaffold(root: &Path) {
    let ocf_lib = root.join("usr/lib/ocf/lib/heartbeat");
    std::fs::create_dir_all(&ocf_lib).unwrap();
    std::fs::write(
        ocf_lib.join("ocf-directories"),
        ": ${HA_DIR:=/etc/ha.d}\n: ${HA_VARLIB:=/var/lib/heartbeat}\n: ${HA_BIN:=/usr/lib/heartbeat}\n",
    )
    .unwrap();

    let daemon_dir = root.join("usr/lib/pacemaker");
    std::fs::create_dir_all(&daemon_dir).unwrap();
    let crmd = daemon_dir.join("crmd");
    std::fs::write(&crmd, "#!/bin/sh\n").unwrap();
    std::fs::set_permissions(&crmd, std::fs::Permissions::from_mode(0o755)).unwrap();

    std::fs::create_dir_all(root.join("var/lib/pacemaker/cib")).unwrap();
    std::fs::create_dir_all(root.join("var/lib/pacemaker/pengine")).unwrap();

    std::fs::create_dir_all(root.join("etc/corosync")).unwrap();
    std::fs::write(
        root.join("etc/corosync/corosync.conf"),
        "logging {\n    debug: on\n    logfile: /var/log/cluster/corosync.log\n    syslog_facility: local7\n}\n",
    )
    .unwrap();
}

#[test]
fn test_probe_finds_layout() {
    let dir = tempfile::tempdir().unwrap();
    scaffold(dir.path());

    let env = ClusterEnv::probe_from(dir.path()).unwrap();
    assert_eq!(env.ha_varlib, Path::new("/var/lib/heartbeat"));
    assert_eq!(env.ha_bin, Path::new("/usr/lib/heartbeat"));
    assert_eq!(env.crm_daemon_dir, dir.path().join("usr/lib/pacemaker"));
    assert_eq!(env.cib_dir, dir.path().join("var/lib/pacemaker/cib"));
    assert_eq!(env.pe_state_dir, dir.path().join("var/lib/pacemaker/pengine"));
    assert_eq!(env.pcmk_lib, dir.path().join("var/lib/pacemaker"));
    assert!(env.cores_dirs.contains(&dir.path().join("var/lib/pacemaker/cores")));
    // corosync.conf exists, so its state dir is also a cores candidate.
    assert!(env.cores_dirs.contains(&dir.path().join("var/lib/corosync")));
    assert_eq!(env.loglevel, "debug");
    assert_eq!(env.syslog_facility, "local7");
    assert_eq!(
        env.corosync_logfile.as_deref(),
        Some(Path::new("/var/log/cluster/corosync.log"))
    );
}

#[test]
fn test_probe_without_ocf_root_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    assert!(ClusterEnv::probe_from(dir.path()).is_err());
}

#[test]
fn test_probe_without_daemon_dir_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    scaffold(dir.path());
    std::fs::remove_file(dir.path().join("usr/lib/pacemaker/crmd")).unwrap();
    assert!(ClusterEnv::probe_from(dir.path()).is_err());
}

#[test]
fn test_find_log_precedence() {
    let dir = tempfile::tempdir().unwrap();
    scaffold(dir.path());
    let env = ClusterEnv::probe_from(dir.path()).unwrap();

    let extra = dir.path().join("messages");
    std::fs::write(&extra, "x\n").unwrap();
    let pcmk = dir.path().join("pacemaker.log");
    std::fs::write(&pcmk, "x\n").unwrap();
    let journal = dir.path().join("journal.log");
    std::fs::write(&journal, "x\n").unwrap();

    let extra_str = extra.display().to_string();
    let pcmk_str = pcmk.display().to_string();

    // Extra logs first, the pacemaker log excluded from them.
    let found = env.find_log(&[pcmk_str.clone(), extra_str.clone()], &pcmk_str, &journal);
    assert_eq!(found.as_deref(), Some(extra.as_path()));

    // Without extras, the collected journal wins.
    let found = env.find_log(&[], &pcmk_str, &journal);
    assert_eq!(found.as_deref(), Some(journal.as_path()));

    // Without a journal, the pacemaker log.
    let found = env.find_log(&[], &pcmk_str, Path::new("/nonexistent/journal.log"));
    assert_eq!(found.as_deref(), Some(pcmk.as_path()));

    // With nothing else, the corosync logfile would be next, but it does not
    // exist in this scaffold, so nothing is found.
    let found = env.find_log(&[], "", Path::new("/nonexistent/journal.log"));
    assert_eq!(found, None);
}
