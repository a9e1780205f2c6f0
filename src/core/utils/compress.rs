// src/core/utils/compress.rs

//! Suffix-driven codec selection with a `file(1)` content sniff fallback,
//! plus helpers to read and write files transparently in whichever format
//! the log rotation left them in.

use crate::core::errors::{ReportError, Result};
use crate::core::utils::{shell, tempfiles};
use async_compression::tokio::bufread::{BzDecoder, GzipDecoder, XzDecoder};
use async_compression::tokio::write::{BzEncoder, GzipEncoder, XzEncoder};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt, BufReader};

/// The compression formats rotated logs and archived cluster files come in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    Plain,
    Gzip,
    Bzip2,
    Xz,
}

impl Codec {
    /// Classifies by filename suffix alone; `None` means the name is not
    /// conclusive and a content sniff is needed.
    pub fn from_suffix(path: &Path) -> Option<Codec> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("gz") => Some(Codec::Gzip),
            Some("bz2") => Some(Codec::Bzip2),
            Some("xz") => Some(Codec::Xz),
            _ => None,
        }
    }

    /// Content sniff via the `file(1)` utility; anything unrecognized is
    /// treated as plain text.
    pub async fn sniff(path: &Path) -> Codec {
        let quoted = shell_words::quote(&path.display().to_string()).into_owned();
        let out = shell::output_of(&format!("file {quoted}")).await;
        if out.contains("bzip2") {
            Codec::Bzip2
        } else if out.contains("gzip") {
            Codec::Gzip
        } else if out.contains("XZ compressed") {
            Codec::Xz
        } else {
            Codec::Plain
        }
    }

    pub async fn for_path(path: &Path) -> Codec {
        match Codec::from_suffix(path) {
            Some(codec) => codec,
            None => Codec::sniff(path).await,
        }
    }

    /// Extension used when packaging a tarball in this format.
    pub fn tar_extension(&self) -> &'static str {
        match self {
            Codec::Plain => "tar",
            Codec::Gzip => "tar.gz",
            Codec::Bzip2 => "tar.bz2",
            Codec::Xz => "tar.xz",
        }
    }
}

/// Opens `path` as a decompressing reader in the given codec.
pub async fn open_decoded(path: &Path, codec: Codec) -> Result<Box<dyn AsyncRead + Unpin + Send>> {
    let reader = BufReader::new(File::open(path).await?);
    Ok(match codec {
        Codec::Plain => Box::new(reader),
        Codec::Gzip => Box::new(GzipDecoder::new(reader)),
        Codec::Bzip2 => Box::new(BzDecoder::new(reader)),
        Codec::Xz => Box::new(XzDecoder::new(reader)),
    })
}

/// Reads the whole file through the matching decoder.
pub async fn read_decoded(path: &Path) -> Result<Vec<u8>> {
    let codec = Codec::for_path(path).await;
    let mut reader = open_decoded(path, codec).await?;
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf).await?;
    Ok(buf)
}

pub async fn read_decoded_to_string(path: &Path) -> Result<String> {
    Ok(String::from_utf8_lossy(&read_decoded(path).await?).into_owned())
}

/// Writes `data` to `path`, encoded with `codec`.
pub async fn write_encoded(path: &Path, data: &[u8], codec: Codec) -> Result<()> {
    let file = File::create(path).await?;
    match codec {
        Codec::Plain => {
            let mut w = file;
            w.write_all(data).await?;
            w.flush().await?;
        }
        Codec::Gzip => {
            let mut w = GzipEncoder::new(file);
            w.write_all(data).await?;
            w.shutdown().await?;
        }
        Codec::Bzip2 => {
            let mut w = BzEncoder::new(file);
            w.write_all(data).await?;
            w.shutdown().await?;
        }
        Codec::Xz => {
            let mut w = XzEncoder::new(file);
            w.write_all(data).await?;
            w.shutdown().await?;
        }
    }
    Ok(())
}

/// Streams `src` into `dest`, encoding with `codec`. Used for packaging,
/// where the tar can be far too large to buffer.
pub async fn encode_file(src: &Path, dest: &Path, codec: Codec) -> Result<()> {
    let mut reader = File::open(src).await?;
    let out = File::create(dest).await?;
    match codec {
        Codec::Plain => {
            let mut w = out;
            tokio::io::copy(&mut reader, &mut w).await?;
            w.flush().await?;
        }
        Codec::Gzip => {
            let mut w = GzipEncoder::new(out);
            tokio::io::copy(&mut reader, &mut w).await?;
            w.shutdown().await?;
        }
        Codec::Bzip2 => {
            let mut w = BzEncoder::new(out);
            tokio::io::copy(&mut reader, &mut w).await?;
            w.shutdown().await?;
        }
        Codec::Xz => {
            let mut w = XzEncoder::new(out);
            tokio::io::copy(&mut reader, &mut w).await?;
            w.shutdown().await?;
        }
    }
    Ok(())
}

/// Decompresses `path` into a registered temp file and returns the temp path.
/// Running out of disk here is fatal: the window extraction that follows
/// would silently operate on a truncated log.
pub async fn decompress_to_temp(path: &Path) -> Result<PathBuf> {
    let codec = Codec::for_path(path).await;
    let tmp = tempfiles::create_temp_file()?;
    let mut reader = open_decoded(path, codec).await?;
    let mut writer = File::create(&tmp).await?;
    match tokio::io::copy(&mut reader, &mut writer).await {
        Ok(_) => {}
        Err(e) if e.kind() == ErrorKind::StorageFull => {
            return Err(ReportError::DiskFull(path.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    }
    writer.flush().await?;
    Ok(tmp)
}
