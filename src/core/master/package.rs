// src/core/master/package.rs

//! Final packaging of the assembled report tree: either a compressed tarball
//! at `DESTDIR/DEST.tar.EXT`, or, with `-d`, the bare directory moved into
//! place.

use crate::config::ReportConfig;
use crate::core::errors::{ReportError, Result};
use crate::core::utils::compress::{self, Codec};
use crate::core::utils::{tarball, tempfiles};
use std::path::{Path, PathBuf};

/// Compressor preference for the final tarball, best first.
const COMPRESSOR_PREFERENCE: &[Codec] = &[Codec::Bzip2, Codec::Gzip, Codec::Xz];

fn preferred_codec() -> Codec {
    // All preference entries are compiled in; the first always wins.
    COMPRESSOR_PREFERENCE[0]
}

/// Packages `work_parent/DEST` into the destination directory and returns the
/// final path.
pub async fn package(config: &ReportConfig, work_parent: &Path) -> Result<PathBuf> {
    let final_path = if config.no_compress {
        let dest = config.dest_dir.join(&config.dest);
        move_dir(&work_parent.join(&config.dest), &dest).await?;
        dest
    } else {
        let codec = preferred_codec();
        let dest = config
            .dest_dir
            .join(format!("{}.{}", config.dest, codec.tar_extension()));

        let plain_tar = tempfiles::create_temp_file()?;
        {
            let parent = work_parent.to_path_buf();
            let name = config.dest.clone();
            let tar_path = plain_tar.clone();
            tokio::task::spawn_blocking(move || tarball::tar_dir_to_file(&parent, &name, &tar_path))
                .await
                .map_err(|e| ReportError::Internal(format!("packaging task failed: {e}")))??;
        }
        compress::encode_file(&plain_tar, &dest, codec).await?;
        dest
    };
    Ok(final_path)
}

/// Moves a directory, falling back to copy-and-delete across filesystems.
async fn move_dir(src: &Path, dest: &Path) -> Result<()> {
    match tokio::fs::rename(src, dest).await {
        Ok(()) => Ok(()),
        Err(_) => {
            let src = src.to_path_buf();
            let dest = dest.to_path_buf();
            tokio::task::spawn_blocking(move || copy_dir_all(&src, &dest))
                .await
                .map_err(|e| ReportError::Internal(format!("copy task failed: {e}")))??;
            Ok(())
        }
    }
}

fn copy_dir_all(src: &Path, dest: &Path) -> Result<()> {
    std::fs::create_dir_all(dest)?;
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let target = dest.join(entry.file_name());
        if entry.path().is_dir() {
            copy_dir_all(&entry.path(), &target)?;
        } else {
            std::fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
