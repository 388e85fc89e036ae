//! Error types for snackpack.
//!
//! [`Error`] covers the fatal class: anything that stops a run before or while
//! it executes. Per-item transfer failures are [`TransferError`]s and never
//! escape the executor; they are folded into
//! [`ErrorRecord`](crate::sync::ErrorRecord)s instead.

use crate::sysexits;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result alias used across the library.
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal errors. Any of these aborts the whole run.
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("could not parse config file: {0}")]
    Toml(#[from] toml::de::Error),

    /// The `type` field is missing or does not carry the expected tag.
    #[error("the loaded config does not look correct: expected type '{expected}', found {found}")]
    SchemaMismatch {
        expected: &'static str,
        found: String,
    },

    /// The config parsed as TOML but does not have the required shape.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("could not find config file: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("no config directory found at {}", .0.display())]
    NoConfigDir(PathBuf),

    #[error("could not determine the home directory")]
    NoHomeDir,

    /// An explicit destination root was given but is not a directory.
    #[error("the destination directory {} does not exist", .0.display())]
    DestinationNotFound(PathBuf),

    #[error("none of the configured destinations could be found")]
    NoDestinationFound,

    /// The operator answered "no" at a confirmation prompt.
    #[error("aborted by user")]
    UserAborted,

    #[error("failed to create directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// Process exit status for this error, following `sysexits`.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Io(_) | Error::CreateDir { .. } => sysexits::EX_IOERR,
            Error::Toml(_) | Error::SchemaMismatch { .. } => sysexits::EX_DATAERR,
            Error::InvalidConfig(_) => sysexits::EX_CONFIG,
            Error::ConfigNotFound(_) | Error::NoConfigDir(_) => sysexits::EX_NOINPUT,
            Error::NoHomeDir => sysexits::EX_OSERR,
            Error::DestinationNotFound(_) | Error::NoDestinationFound => sysexits::EX_UNAVAILABLE,
            Error::UserAborted => sysexits::EX_TEMPFAIL,
        }
    }
}

/// A failure while transferring a single item.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The mirror process ran but exited unsuccessfully.
    #[error("{program} exited with {}\n{output}", status_label(.code))]
    Exit {
        program: String,
        code: Option<i32>,
        output: String,
    },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Walk(#[from] walkdir::Error),
}

fn status_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "no status (terminated by signal)".to_string(),
    }
}
