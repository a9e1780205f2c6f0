// tests/unit_tempfiles_test.rs

//! The registry sweep runs exactly once per process, so the whole lifecycle
//! lives in a single test function.

use hbreport::core::utils::tempfiles;
use std::path::PathBuf;

#[test]
fn test_registry_lifecycle() {
    tempfiles::init().unwrap();
    tempfiles::init().unwrap(); // idempotent

    let file = tempfiles::create_temp_file().unwrap();
    assert!(file.is_file());

    let dir = tempfiles::create_work_dir().unwrap();
    assert!(dir.is_dir());
    std::fs::write(dir.join("payload.txt"), "x").unwrap();

    // A path created by other means can be registered for the sweep too.
    let extra = PathBuf::from(format!("{}.extra", file.display()));
    std::fs::write(&extra, "x").unwrap();
    tempfiles::register(&extra).unwrap();

    tempfiles::cleanup();
    assert!(!file.exists());
    assert!(!dir.exists());
    assert!(!extra.exists());

    // A second sweep is a no-op, not a crash.
    tempfiles::cleanup();
}
