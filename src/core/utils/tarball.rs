// src/core/utils/tarball.rs

//! Tar plumbing: the collector streams its per-node directory to stdout, the
//! master splices each peer's stream back in under its own working root, and
//! packaging rolls the whole report tree into one archive.
//!
//! All of these are synchronous `std::io` pipelines; callers run them inside
//! `spawn_blocking`.

use std::io::{Read, Write};
use std::path::Path;

/// Writes a tar stream of `parent/name` to `out`, with entries rooted at
/// `name/` so extraction lands as a sibling of the receiver's own subtrees.
pub fn stream_dir<W: Write>(parent: &Path, name: &str, out: W) -> std::io::Result<()> {
    let mut builder = tar::Builder::new(out);
    builder.follow_symlinks(false);
    builder.append_dir_all(name, parent.join(name))?;
    builder.into_inner()?.flush()
}

/// Extracts a tar stream under `root`. The tar crate refuses entries that
/// would escape `root`, which keeps a misbehaving peer from writing outside
/// the working tree.
pub fn extract_stream<R: Read>(reader: R, root: &Path) -> std::io::Result<()> {
    let mut archive = tar::Archive::new(reader);
    archive.set_preserve_permissions(true);
    archive.unpack(root)
}

/// Tars `parent/name` into the file at `tar_path` (uncompressed; the caller
/// pipes it through a codec when packaging).
pub fn tar_dir_to_file(parent: &Path, name: &str, tar_path: &Path) -> std::io::Result<()> {
    let file = std::fs::File::create(tar_path)?;
    stream_dir(parent, name, file)
}
