//! Destination resolution.
//!
//! The destination root is either given explicitly or found by walking the
//! config's candidates in order and taking the first mounted one.

use crate::config::Destination;
use crate::error::{Error, Result};
use crate::progress::Progress;
use crate::prompt::Prompter;
use crate::sync::Mode;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Answers whether a path is currently a mount point.
pub trait MountProbe {
    fn is_mount(&self, path: &Path) -> bool;
}

/// Checks mount points against the live filesystem.
#[derive(Debug, Default)]
pub struct SystemMounts;

impl MountProbe for SystemMounts {
    /// A directory is a mount point when it lives on a different device than
    /// its parent, or when it is its own parent (the filesystem root).
    #[cfg(unix)]
    fn is_mount(&self, path: &Path) -> bool {
        use std::os::unix::fs::MetadataExt;

        let Ok(meta) = fs::symlink_metadata(path) else {
            return false;
        };
        if !meta.is_dir() {
            return false;
        }
        let Ok(parent) = fs::symlink_metadata(path.join("..")) else {
            return false;
        };
        meta.dev() != parent.dev() || meta.ino() == parent.ino()
    }

    #[cfg(not(unix))]
    fn is_mount(&self, path: &Path) -> bool {
        path.is_dir() && path.parent().is_none()
    }
}

/// Finds the destination root for a run.
///
/// With `override_root`, that directory is used as is and must already
/// exist. Otherwise the first mounted candidate wins; later candidates are
/// never looked at. In [`Mode::Execute`] a missing root below the mount is
/// created once the operator agrees; in [`Mode::DryRun`] it is returned
/// without being created.
pub fn resolve(
    candidates: &[Destination],
    override_root: Option<&Path>,
    mode: Mode,
    mounts: &dyn MountProbe,
    prompter: &mut dyn Prompter,
    progress: &mut dyn Progress,
) -> Result<PathBuf> {
    if let Some(root) = override_root {
        if !root.is_dir() {
            return Err(Error::DestinationNotFound(root.to_path_buf()));
        }
        info!(root = %root.display(), "using destination override");
        return Ok(root.to_path_buf());
    }

    for candidate in candidates {
        let (mount, path) = match candidate {
            Destination::Mount { mount, path } => (mount, path),
            Destination::Unsupported { kind, .. } => {
                debug!(kind = %kind, "skipping unsupported destination kind");
                continue;
            }
        };

        debug!(mount = %mount.display(), "looking for mount");
        let mounted = mounts.is_mount(mount);
        progress.on_probe(mount, mounted);
        if !mounted {
            continue;
        }

        let root = mount.join(path);
        if !root.is_dir() && mode == Mode::Execute {
            let question = format!(
                "The path {} does not exist on {}. Should we make it?",
                path.display(),
                mount.display()
            );
            if !prompter.confirm(&question)? {
                return Err(Error::UserAborted);
            }
            fs::create_dir_all(&root).map_err(|source| Error::CreateDir {
                path: root.clone(),
                source,
            })?;
            progress.on_destination_created(&root);
        }
        info!(root = %root.display(), "found destination");
        return Ok(root);
    }

    Err(Error::NoDestinationFound)
}
