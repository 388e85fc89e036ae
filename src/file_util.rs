//! Local file operations behind the transfer strategies.

use crate::error::TransferError;
use filetime::FileTime;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Copies a file, overwriting `dest`, and carries over permissions plus
/// access and modification times.
pub fn copy_with_metadata(src: &Path, dest: &Path) -> io::Result<()> {
    if let Ok(meta) = fs::symlink_metadata(dest)
        && meta.is_dir()
    {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("Cannot copy file to directory {}", dest.display()),
        ));
    }
    // fs::copy also copies permission bits
    fs::copy(src, dest)?;
    let meta = fs::metadata(src)?;
    filetime::set_file_times(
        dest,
        FileTime::from_last_access_time(&meta),
        FileTime::from_last_modification_time(&meta),
    )?;
    Ok(())
}

/// Whether `dest` is missing or differs from `src` in size or mtime.
pub fn needs_update(src: &Path, dest: &Path) -> io::Result<bool> {
    let Ok(dest_meta) = fs::symlink_metadata(dest) else {
        return Ok(true);
    };
    if !dest_meta.is_file() {
        return Ok(true);
    }
    let src_meta = fs::metadata(src)?;
    Ok(src_meta.len() != dest_meta.len()
        || FileTime::from_last_modification_time(&src_meta)
            != FileTime::from_last_modification_time(&dest_meta))
}

/// Makes `dest` an exact copy of the tree under `src`.
///
/// Files are copied only when [`needs_update`] says so, symlinks are
/// recreated rather than followed, and anything under `dest` that has no
/// counterpart under `src` is deleted. Running it twice on an unchanged
/// source leaves `dest` as it was. Returns the number of entries written or
/// removed.
pub fn mirror_tree(src: &Path, dest: &Path) -> Result<usize, TransferError> {
    fs::create_dir_all(dest)?;
    let mut changed = 0;
    let mut expected = HashSet::new();

    for entry in WalkDir::new(src).min_depth(1) {
        let entry = entry?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| io::Error::other(e.to_string()))?;
        let target = dest.join(rel);
        let ft = entry.file_type();

        if ft.is_dir() {
            if !target.is_dir() || is_symlink(&target) {
                remove_any(&target)?;
                fs::create_dir(&target)?;
                changed += 1;
            }
        } else if ft.is_symlink() {
            if sync_symlink(entry.path(), &target)? {
                changed += 1;
            }
        } else if ft.is_file() {
            if is_symlink(&target) || target.is_dir() {
                remove_any(&target)?;
            }
            if needs_update(entry.path(), &target)? {
                copy_with_metadata(entry.path(), &target)?;
                changed += 1;
            }
        } else {
            debug!(path = %entry.path().display(), "skipping special file");
            continue;
        }
        expected.insert(target);
    }

    let mut stale: Vec<PathBuf> = vec![];
    let mut walker = WalkDir::new(dest).min_depth(1).into_iter();
    while let Some(entry) = walker.next() {
        let entry = entry?;
        if expected.contains(entry.path()) {
            continue;
        }
        if entry.file_type().is_dir() {
            walker.skip_current_dir();
        }
        stale.push(entry.into_path());
    }
    for path in stale {
        debug!(path = %path.display(), "deleting");
        remove_any(&path)?;
        changed += 1;
    }

    Ok(changed)
}

fn is_symlink(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok_and(|m| m.file_type().is_symlink())
}

/// Removes whatever is at `path`, if anything. Links are removed, not followed.
fn remove_any(path: &Path) -> io::Result<()> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Points `target` at the same place as the link `src`. Returns whether
/// anything changed.
#[cfg(unix)]
fn sync_symlink(src: &Path, target: &Path) -> io::Result<bool> {
    let link = fs::read_link(src)?;
    if fs::read_link(target).is_ok_and(|current| current == link) {
        return Ok(false);
    }
    remove_any(target)?;
    std::os::unix::fs::symlink(link, target)?;
    Ok(true)
}

#[cfg(not(unix))]
fn sync_symlink(src: &Path, _target: &Path) -> io::Result<bool> {
    debug!(path = %src.display(), "symlinks are not mirrored on this platform");
    Ok(false)
}
