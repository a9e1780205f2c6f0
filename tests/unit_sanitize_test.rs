// tests/unit_sanitize_test.rs

use filetime::FileTime;
use hbreport::core::sanitize::{Sanitizer, sanitize_workdir};
use hbreport::core::utils::compress::{self, Codec};

fn patterns() -> Vec<String> {
    vec!["passw.*".to_string()]
}

#[test]
fn test_detects_sensitive_attribute() {
    let s = Sanitizer::new(&patterns()).unwrap();
    assert!(s.line_needs_sanitizing(r#"<nvpair name="password" value="123456"/>"#));
    assert!(!s.line_needs_sanitizing(r#"<nvpair name="timeout" value="30s"/>"#));
}

#[test]
fn test_rewrites_value_to_mask() {
    let s = Sanitizer::new(&patterns()).unwrap();
    let line = r#"<nvpair name="password" value="123456"/>"#;
    assert_eq!(
        s.sanitize_line(line),
        r#"<nvpair name="password" value="******"/>"#
    );
}

#[test]
fn test_untouched_attributes_survive() {
    let s = Sanitizer::new(&patterns()).unwrap();
    let line = r#"<nvpair name="ip" value="10.0.0.1"/> <nvpair name="passwd" value="hunter2"/>"#;
    assert_eq!(
        s.sanitize_line(line),
        r#"<nvpair name="ip" value="10.0.0.1"/> <nvpair name="passwd" value="******"/>"#
    );
}

#[test]
fn test_idempotence() {
    let s = Sanitizer::new(&patterns()).unwrap();
    let text = concat!(
        "<cib>\n",
        r#"  <nvpair name="password" value="123456"/>"#,
        "\n",
        r#"  <nvpair name="user" value="admin"/>"#,
        "\n</cib>\n"
    );
    let once = s.sanitize_text(text);
    let twice = s.sanitize_text(&once);
    assert_eq!(once, twice);
    assert!(once.contains(r#"name="password" value="******""#));
    assert!(once.contains(r#"name="user" value="admin""#));
}

#[tokio::test]
async fn test_apply_preserves_timestamps() {
    let dir = tempfile::tempdir().unwrap();
    let cib = dir.path().join("cib.xml");
    tokio::fs::write(&cib, r#"<nvpair name="password" value="s3cr3t"/>"#)
        .await
        .unwrap();
    let old = FileTime::from_unix_time(1_485_400_000, 0);
    filetime::set_file_times(&cib, old, old).unwrap();

    let s = Sanitizer::new(&patterns()).unwrap();
    s.apply_file(&cib).await.unwrap();

    let contents = tokio::fs::read_to_string(&cib).await.unwrap();
    assert!(contents.contains(r#"value="******""#));
    let meta = std::fs::metadata(&cib).unwrap();
    let mtime = FileTime::from_last_modification_time(&meta);
    assert!((mtime.unix_seconds() - old.unix_seconds()).abs() <= 1);
}

#[tokio::test]
async fn test_compressed_rewrite_keeps_format() {
    let dir = tempfile::tempdir().unwrap();
    let pengine = dir.path().join("pengine");
    tokio::fs::create_dir_all(&pengine).await.unwrap();
    let input = pengine.join("pe-input-42.gz");
    compress::write_encoded(
        &input,
        br#"<nvpair name="password" value="s3cr3t"/>"#,
        Codec::Gzip,
    )
    .await
    .unwrap();

    let found = sanitize_workdir(dir.path(), &patterns(), true).await.unwrap();
    assert!(found);

    // Still gzip on disk, masked once decoded.
    let raw = tokio::fs::read(&input).await.unwrap();
    assert_eq!(&raw[..2], &[0x1f, 0x8b]);
    let decoded = compress::read_decoded_to_string(&input).await.unwrap();
    assert!(decoded.contains(r#"value="******""#));
    assert!(!decoded.contains("s3cr3t"));
}

#[tokio::test]
async fn test_test_mode_reports_without_rewriting() {
    let dir = tempfile::tempdir().unwrap();
    let cib = dir.path().join("cib.xml");
    let original = r#"<nvpair name="password" value="123456"/>"#;
    tokio::fs::write(&cib, original).await.unwrap();

    let found = sanitize_workdir(dir.path(), &patterns(), false).await.unwrap();
    assert!(found);
    let contents = tokio::fs::read_to_string(&cib).await.unwrap();
    assert_eq!(contents, original);
}
