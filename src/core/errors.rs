// src/core/errors.rs

//! Defines the primary error type for the entire application.

use std::path::PathBuf;
use thiserror::Error;

/// The main error enum, representing all possible failures within the collector.
/// Using `thiserror` allows for clean error definitions and automatic `From` trait
/// implementations.
///
/// Only a handful of classes are fatal (bad configuration, missing cluster
/// layout, resource exhaustion); everything else is surfaced as a warning and
/// recorded in the report itself so the analyst can see what was missing.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("bad time specification: {0}")]
    BadTimeSpec(String),

    #[error("{0} is invalid, please give a simple name without '/'")]
    UnsafeDestination(String),

    #[error("destination directory {0} does not exist")]
    MissingDestDir(PathBuf),

    #[error("destination {0} exists, please cleanup or use -Z")]
    DestinationExists(PathBuf),

    #[error("could not figure out a list of nodes; is this a cluster node?")]
    NoNodes,

    #[error("cannot find cluster daemon directory")]
    NoDaemonDir,

    #[error("file {0} does not exist")]
    MissingFile(PathBuf),

    #[error("directory {0} does not exist")]
    MissingDir(PathBuf),

    #[error("cannot create temporary file: {0}")]
    TempFile(String),

    #[error("disk full while decompressing {0}")]
    DiskFull(PathBuf),

    #[error("invalid serialized environment token: {0}")]
    BadEnvToken(String),

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("invalid glob pattern: {0}")]
    Glob(#[from] glob::PatternError),

    #[error("malformed command line: {0}")]
    ShellWords(#[from] shell_words::ParseError),

    #[error("remote shell to {0} failed")]
    SshFailed(String),

    #[error("Internal Error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, ReportError>;
