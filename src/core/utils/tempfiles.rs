// src/core/utils/tempfiles.rs

//! The process-wide temporary file registry.
//!
//! Every temporary file or directory the process creates is appended to a
//! single registry file, one absolute path per line. On any exit path the
//! sweep runs exactly once: files are unlinked, directories are removed
//! recursively, and the registry file itself goes last. Collectors spawned on
//! peer nodes are separate processes and keep their own registries.

use crate::core::errors::{ReportError, Result};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use rand::Rng;
use rand::distributions::Alphanumeric;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Once;
use tracing::{debug, warn};

static REGISTRY: OnceCell<Mutex<PathBuf>> = OnceCell::new();
static SWEEP: Once = Once::new();

fn random_suffix(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

fn keep_new_file(suffix: &str) -> Result<PathBuf> {
    let file = tempfile::Builder::new()
        .prefix("tmp.")
        .suffix(suffix)
        .tempfile()
        .map_err(|e| ReportError::TempFile(e.to_string()))?;
    let (_, path) = file
        .keep()
        .map_err(|e| ReportError::TempFile(e.to_string()))?;
    Ok(path)
}

/// Creates the registry file itself and installs it as the process singleton.
/// Must run before any temp path is handed out; calling it again is a no-op.
pub fn init() -> Result<()> {
    if REGISTRY.get().is_some() {
        return Ok(());
    }
    let path = keep_new_file("")?;
    let _ = REGISTRY.set(Mutex::new(path));
    Ok(())
}

/// Appends a path to the registry so it is deleted at exit. Line-oriented
/// appends keep concurrent registration from interleaving.
pub fn register(path: &Path) -> Result<()> {
    let registry = REGISTRY
        .get()
        .ok_or_else(|| ReportError::Internal("temp registry not initialized".into()))?;
    let registry = registry.lock();
    let mut f = OpenOptions::new().append(true).open(&*registry)?;
    writeln!(f, "{}", path.display())?;
    Ok(())
}

/// Creates and registers an empty temporary file, returning its path.
pub fn create_temp_file() -> Result<PathBuf> {
    let path = keep_new_file(&random_suffix(4))?;
    register(&path)?;
    Ok(path)
}

/// Creates and registers the working directory that will hold the report
/// tree until packaging.
pub fn create_work_dir() -> Result<PathBuf> {
    let dir = tempfile::Builder::new()
        .prefix(".hbreport.workdir.")
        .tempdir()
        .map_err(|e| ReportError::TempFile(e.to_string()))?;
    let path = dir.keep();
    register(&path)?;
    Ok(path)
}

/// Deletes every registered path, then the registry file. Runs at most once
/// regardless of how many exit paths reach it.
pub fn cleanup() {
    SWEEP.call_once(|| {
        let Some(registry) = REGISTRY.get() else {
            return;
        };
        let registry = registry.lock();
        let contents = match std::fs::read_to_string(&*registry) {
            Ok(c) => c,
            Err(e) => {
                warn!("cannot read temp registry {}: {}", registry.display(), e);
                return;
            }
        };
        for line in contents.lines().filter(|l| !l.is_empty()) {
            let path = Path::new(line);
            let removed = if path.is_dir() {
                std::fs::remove_dir_all(path)
            } else if path.is_file() {
                std::fs::remove_file(path)
            } else {
                continue;
            };
            match removed {
                Ok(()) => debug!("removed temp path {}", path.display()),
                Err(e) => warn!("cannot remove temp path {}: {}", path.display(), e),
            }
        }
        if let Err(e) = std::fs::remove_file(&*registry) {
            warn!("cannot remove temp registry {}: {}", registry.display(), e);
        }
    });
}
