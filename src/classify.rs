//! Filesystem kind of a configured path.
//!
//! There are two views of a path. [`classify`] is link-aware and is what
//! reports show. [`dispatch_kind`] follows links and decides which transfer
//! strategy runs, so a link to a directory is mirrored like a directory.

use std::fmt;
use std::fs;
use std::path::Path;

/// Kind of a path. Ordering is the order used in coverage reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PathKind {
    Directory,
    RegularFile,
    SymbolicLink,
    /// Missing, or neither file, directory nor link.
    Other,
}

impl fmt::Display for PathKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PathKind::Directory => "dir",
            PathKind::RegularFile => "file",
            PathKind::SymbolicLink => "link",
            PathKind::Other => "other",
        };
        f.write_str(s)
    }
}

/// Link-aware classification. Links are reported as links even when they
/// point at a directory.
pub fn classify(path: &Path) -> PathKind {
    let Ok(meta) = fs::symlink_metadata(path) else {
        return PathKind::Other;
    };
    let ft = meta.file_type();
    if ft.is_symlink() {
        PathKind::SymbolicLink
    } else if ft.is_dir() {
        PathKind::Directory
    } else if ft.is_file() {
        PathKind::RegularFile
    } else {
        PathKind::Other
    }
}

/// Classification for transfer dispatch. Follows links; never returns
/// [`PathKind::SymbolicLink`]. A dangling link is [`PathKind::Other`].
pub fn dispatch_kind(path: &Path) -> PathKind {
    if path.is_dir() {
        PathKind::Directory
    } else if path.is_file() {
        PathKind::RegularFile
    } else {
        PathKind::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::TempDir;

    #[test]
    fn test_classify_basic_kinds() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.txt");
        File::create(&file).unwrap();

        assert_eq!(classify(dir.path()), PathKind::Directory);
        assert_eq!(classify(&file), PathKind::RegularFile);
        assert_eq!(classify(&dir.path().join("ghost")), PathKind::Other);

        assert_eq!(dispatch_kind(dir.path()), PathKind::Directory);
        assert_eq!(dispatch_kind(&file), PathKind::RegularFile);
        assert_eq!(dispatch_kind(&dir.path().join("ghost")), PathKind::Other);
    }

    #[cfg(unix)]
    #[test]
    fn test_link_to_directory_is_asymmetric() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("target");
        fs::create_dir(&target).unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        assert_eq!(classify(&link), PathKind::SymbolicLink);
        assert_eq!(dispatch_kind(&link), PathKind::Directory);

        let dangling = dir.path().join("dangling");
        std::os::unix::fs::symlink(dir.path().join("gone"), &dangling).unwrap();
        assert_eq!(classify(&dangling), PathKind::SymbolicLink);
        assert_eq!(dispatch_kind(&dangling), PathKind::Other);
    }

    #[test]
    fn test_report_order() {
        let mut kinds = vec![PathKind::Other, PathKind::RegularFile, PathKind::Directory];
        kinds.sort();
        assert_eq!(
            kinds,
            vec![PathKind::Directory, PathKind::RegularFile, PathKind::Other]
        );
    }
}
