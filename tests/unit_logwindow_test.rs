// tests/unit_logwindow_test.rs

use hbreport::core::logtime::{dump_log_window, stamp};
use hbreport::core::utils::compress::{self, Codec};
use hbreport::core::utils::tempfiles;
use std::path::Path;
use std::time::Duration;

fn ts(hour: usize, minute: usize) -> f64 {
    stamp::parse_to_timestamp(&format!("2017-01-26T{hour:02}:{minute:02}:00+00:00")).unwrap()
}

fn log_lines(hour: usize, minutes: std::ops::Range<usize>) -> String {
    minutes
        .map(|m| format!("2017-01-26T{hour:02}:{m:02}:00+00:00 host daemon: h{hour} m{m}\n"))
        .collect()
}

#[tokio::test]
async fn test_full_window_equals_whole_file() {
    tempfiles::init().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("cluster.log");
    let content = log_lines(10, 0..30);
    tokio::fs::write(&log, &content).await.unwrap();

    let out = dump_log_window(&log, ts(10, 0), ts(10, 29)).await.unwrap();
    assert_eq!(out, content);
}

#[tokio::test]
async fn test_open_upper_bound_includes_last_line() {
    tempfiles::init().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("cluster.log");
    tokio::fs::write(&log, log_lines(10, 0..30)).await.unwrap();

    let out = dump_log_window(&log, ts(10, 15), 0.0).await.unwrap();
    assert!(out.lines().next().unwrap().contains("m15"));
    assert!(out.lines().last().unwrap().contains("m29"));
}

#[tokio::test]
async fn test_inner_window_is_contiguous() {
    tempfiles::init().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("cluster.log");
    tokio::fs::write(&log, log_lines(10, 0..30)).await.unwrap();

    let out = dump_log_window(&log, ts(10, 10), ts(10, 20)).await.unwrap();
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 11);
    assert!(lines[0].contains("m10"));
    assert!(lines[10].contains("m20"));
}

#[tokio::test]
async fn test_two_archive_extraction() {
    tempfiles::init().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let primary = dir.path().join("cluster.log");

    // Rotated archive covers 10:00-10:59, gzip-compressed; primary covers
    // 11:00-11:59. The rotated file must be older by ctime.
    let rotated = dir.path().join("cluster.log.1.gz");
    compress::write_encoded(&rotated, log_lines(10, 0..60).as_bytes(), Codec::Gzip)
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    tokio::fs::write(&primary, log_lines(11, 0..60)).await.unwrap();

    let out = dump_log_window(&primary, ts(10, 30), ts(11, 30)).await.unwrap();
    let lines: Vec<&str> = out.lines().collect();
    assert!(lines.first().unwrap().contains("h10 m30"));
    assert!(lines.last().unwrap().contains("h11 m30"));
    // 30 lines from the archive tail, 31 from the primary head.
    assert_eq!(lines.len(), 61);
    // Chronological and without duplicates.
    let boundary = lines.iter().position(|l| l.contains("h11 m0")).unwrap();
    assert!(lines[..boundary].iter().all(|l| l.contains("h10")));
    assert!(lines[boundary..].iter().all(|l| l.contains("h11")));
}

#[tokio::test]
async fn test_window_before_any_archive_is_empty() {
    tempfiles::init().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("cluster.log");
    tokio::fs::write(&log, log_lines(10, 0..10)).await.unwrap();

    let out = dump_log_window(&log, ts(12, 0), ts(13, 0)).await.unwrap();
    assert!(out.is_empty());
}

#[tokio::test]
async fn test_unstampable_file_is_skipped_not_fatal() {
    tempfiles::init().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("cluster.log");
    let garbage: String = (0..20).map(|i| format!("garbage line {i}\n")).collect();
    tokio::fs::write(&log, garbage).await.unwrap();

    let out = dump_log_window(&log, 1000.0, 2000.0).await.unwrap();
    assert!(out.is_empty());
}

#[tokio::test]
async fn test_missing_file_warns_and_returns_empty() {
    tempfiles::init().unwrap();
    let out = dump_log_window(Path::new("/nonexistent/cluster.log"), 1000.0, 2000.0)
        .await
        .unwrap();
    assert!(out.is_empty());
}
