//! Sync planning and execution.
//!
//! Chunks are walked in config order and each source path becomes one
//! [`TransferItem`]. Items run strictly one after another: chunks may share
//! or nest destination trees and mirrors delete, so order matters.
//!
//! Failures come in two classes. A declined prompt or an unusable chunk
//! destination aborts the run with an [`Error`]. Anything that goes wrong
//! with a single item is stored as an [`ErrorRecord`] and the run moves on.

use crate::classify::{PathKind, dispatch_kind};
use crate::config::Chunk;
use crate::constants::NOT_FILE_OR_DIR;
use crate::error::{Error, Result, TransferError};
use crate::file_util;
use crate::mirror::Mirror;
use crate::progress::Progress;
use crate::prompt::Prompter;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Whether a run touches the filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Execute,
    /// Report every operation, perform none.
    DryRun,
}

/// Inputs shared by every item of a run.
#[derive(Debug, Clone)]
pub struct SyncContext {
    /// Base of every configured source path.
    pub home: PathBuf,
    /// Resolved destination root.
    pub dest_root: PathBuf,
    pub mode: Mode,
    /// Ask before every item.
    pub interactive: bool,
}

/// What happened to an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Expanded but not dispatched yet.
    Pending,
    Transferred,
    /// Dry run; nothing was done.
    Skipped,
    Error(String),
}

/// One source path of one chunk.
#[derive(Debug, Clone)]
pub struct TransferItem {
    pub chunk_name: String,
    pub relative_path: String,
    pub source: PathBuf,
    pub dest: PathBuf,
    pub kind: PathKind,
    pub outcome: Outcome,
}

/// A non-fatal failure, kept for the end-of-run summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRecord {
    pub source: PathBuf,
    pub dest: PathBuf,
    pub message: String,
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} => {}: {}",
            self.source.display(),
            self.dest.display(),
            self.message
        )
    }
}

/// Result of a completed run.
#[derive(Debug, Default)]
pub struct SyncReport {
    /// Every item in the order it was processed.
    pub items: Vec<TransferItem>,
    /// Item failures in the order they happened.
    pub errors: Vec<ErrorRecord>,
}

impl SyncReport {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Syncs every chunk into `ctx.dest_root`.
///
/// Returns `Err` only for fatal conditions. Item failures end up in
/// [`SyncReport::errors`].
pub fn execute(
    chunks: &[Chunk],
    ctx: &SyncContext,
    mirror: &dyn Mirror,
    prompter: &mut dyn Prompter,
    progress: &mut dyn Progress,
) -> Result<SyncReport> {
    let mut report = SyncReport::default();

    for chunk in chunks {
        let base_dest = ctx.dest_root.join(&chunk.dest);
        progress.on_chunk_started(chunk, &base_dest);
        if ctx.mode == Mode::Execute {
            fs::create_dir_all(&base_dest).map_err(|source| Error::CreateDir {
                path: base_dest.clone(),
                source,
            })?;
        }

        for rel in &chunk.sources {
            let mut item = TransferItem {
                chunk_name: chunk.name.clone(),
                relative_path: rel.clone(),
                source: ctx.home.join(rel),
                dest: base_dest.join(rel),
                kind: PathKind::Other,
                outcome: Outcome::Pending,
            };
            progress.on_item_started(&item);

            if ctx.interactive && !prompter.confirm("continue?")? {
                return Err(Error::UserAborted);
            }

            item.kind = dispatch_kind(&item.source);
            debug!(source = %item.source.display(), kind = %item.kind, "dispatching");
            item.outcome = match transfer(&item, ctx.mode, mirror, progress) {
                Ok(outcome) => outcome,
                Err(message) => {
                    warn!(source = %item.source.display(), "{message}");
                    report.errors.push(ErrorRecord {
                        source: item.source.clone(),
                        dest: item.dest.clone(),
                        message: message.clone(),
                    });
                    Outcome::Error(message)
                }
            };
            progress.on_item_completed(&item);
            report.items.push(item);
        }
    }

    Ok(report)
}

/// Runs the strategy for one classified item.
fn transfer(
    item: &TransferItem,
    mode: Mode,
    mirror: &dyn Mirror,
    progress: &mut dyn Progress,
) -> std::result::Result<Outcome, String> {
    let (src, dest) = (item.source.as_path(), item.dest.as_path());
    match (item.kind, mode) {
        (PathKind::Directory, Mode::DryRun) => {
            progress.on_planned(&mirror.describe(src, dest));
            Ok(Outcome::Skipped)
        }
        (PathKind::Directory, Mode::Execute) => {
            mirror_dir(src, dest, mirror, progress).map_err(|e| e.to_string())?;
            Ok(Outcome::Transferred)
        }
        (PathKind::RegularFile, Mode::DryRun) => {
            progress.on_planned(&describe_copy(src, dest));
            Ok(Outcome::Skipped)
        }
        (PathKind::RegularFile, Mode::Execute) => {
            copy_file(src, dest).map_err(|e| e.to_string())?;
            Ok(Outcome::Transferred)
        }
        _ => Err(NOT_FILE_OR_DIR.to_string()),
    }
}

fn mirror_dir(
    src: &Path,
    dest: &Path,
    mirror: &dyn Mirror,
    progress: &mut dyn Progress,
) -> std::result::Result<(), TransferError> {
    fs::create_dir_all(dest)?;
    mirror.mirror(src, dest, &mut |line| progress.on_mirror_line(line))
}

/// Copies a single configured file. Its parent may not exist yet when the
/// relative path has several components.
fn copy_file(src: &Path, dest: &Path) -> std::result::Result<(), TransferError> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    file_util::copy_with_metadata(src, dest)?;
    Ok(())
}

fn describe_copy(src: &Path, dest: &Path) -> String {
    format!("copy {} {}", src.display(), dest.display())
}
