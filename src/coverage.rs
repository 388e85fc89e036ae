//! Coverage of the home directory by a config.
//!
//! Compares the direct children of the home directory with the paths the
//! chunks name, and adds up how much space the covered paths take.

use crate::classify::{PathKind, classify};
use crate::config::Chunk;
use crate::error::Result;
use clap::ValueEnum;
use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::warn;
use walkdir::WalkDir;

/// Measures disk usage in kilobytes.
pub trait DiskUsage {
    fn size_kb(&self, path: &Path) -> io::Result<u64>;
}

/// Which [`DiskUsage`] implementation to use.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UsageBackend {
    /// `du -sk`
    #[default]
    Du,
    /// Built-in directory walk
    Native,
}

impl UsageBackend {
    pub fn build(self) -> Box<dyn DiskUsage> {
        match self {
            UsageBackend::Du => Box::new(Du),
            UsageBackend::Native => Box::new(NativeUsage),
        }
    }
}

/// Asks `du -sk`.
#[derive(Debug, Default)]
pub struct Du;

impl DiskUsage for Du {
    fn size_kb(&self, path: &Path) -> io::Result<u64> {
        let output = Command::new("du").arg("-sk").arg(path).output()?;
        if !output.status.success() {
            return Err(io::Error::other(format!(
                "du failed for {}: {}",
                path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        parse_du_output(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Reads the size column of `du -sk` output.
fn parse_du_output(out: &str) -> io::Result<u64> {
    out.split_whitespace()
        .next()
        .and_then(|kb| kb.parse().ok())
        .ok_or_else(|| io::Error::other(format!("unexpected du output: {out:?}")))
}

/// Sums allocated blocks while walking the tree, without following links.
#[derive(Debug, Default)]
pub struct NativeUsage;

impl DiskUsage for NativeUsage {
    fn size_kb(&self, path: &Path) -> io::Result<u64> {
        let mut bytes = 0;
        for entry in WalkDir::new(path) {
            let meta = entry.map_err(io::Error::other)?.metadata().map_err(io::Error::other)?;
            bytes += allocated_bytes(&meta);
        }
        Ok(bytes.div_ceil(1024))
    }
}

#[cfg(unix)]
fn allocated_bytes(meta: &fs::Metadata) -> u64 {
    use std::os::unix::fs::MetadataExt;
    meta.blocks() * 512
}

#[cfg(not(unix))]
fn allocated_bytes(meta: &fs::Metadata) -> u64 {
    meta.len()
}

/// A covered path with its measured size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoveredEntry {
    pub relative_path: PathBuf,
    pub kind: PathKind,
    pub size_kb: u64,
}

/// Result of [`analyze`].
#[derive(Debug, Default)]
pub struct Coverage {
    /// Direct children of home that no chunk names, sorted.
    pub skipped: Vec<PathBuf>,
    /// Covered paths, sorted by kind and then path.
    pub covered: Vec<CoveredEntry>,
    /// Configured paths that could not be classified or measured, sorted.
    pub malformed: Vec<PathBuf>,
    pub total_kb: u64,
}

impl Coverage {
    pub fn total(&self) -> SizeSummary {
        SizeSummary(self.total_kb)
    }
}

/// A kilobyte count shown in decimal units (1 MB = 1000 KB).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeSummary(pub u64);

impl SizeSummary {
    pub fn mb(&self) -> f64 {
        self.0 as f64 / 1000.0
    }

    pub fn gb(&self) -> f64 {
        self.0 as f64 / 1000.0_f64.powi(2)
    }
}

impl fmt::Display for SizeSummary {
    // Debug formatting keeps the trailing `.0` on whole numbers.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}K, {:?}M, {:?}G", self.0, self.mb(), self.gb())
    }
}

/// Works out which direct children of `home` the chunks cover.
pub fn analyze(home: &Path, chunks: &[Chunk], usage: &dyn DiskUsage) -> Result<Coverage> {
    let mut all = BTreeSet::new();
    for entry in fs::read_dir(home)? {
        all.insert(entry?.path());
    }

    let covered: BTreeSet<PathBuf> = chunks
        .iter()
        .flat_map(|chunk| chunk.sources.iter())
        .map(|rel| home.join(rel))
        .collect();

    let relative = |p: &Path| p.strip_prefix(home).unwrap_or(p).to_path_buf();

    let mut report = Coverage {
        skipped: all.difference(&covered).map(|p| relative(p.as_path())).collect(),
        ..Coverage::default()
    };

    for path in covered.iter().map(PathBuf::as_path) {
        let kind = classify(path);
        if kind == PathKind::Other {
            report.malformed.push(relative(path));
            continue;
        }
        match usage.size_kb(path) {
            Ok(size_kb) => {
                report.total_kb += size_kb;
                report.covered.push(CoveredEntry {
                    relative_path: relative(path),
                    kind,
                    size_kb,
                });
            }
            Err(e) => {
                warn!(path = %path.display(), "could not measure: {e}");
                report.malformed.push(relative(path));
            }
        }
    }

    report
        .covered
        .sort_by(|a, b| (a.kind, &a.relative_path).cmp(&(b.kind, &b.relative_path)));
    report.malformed.sort();
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    /// Sizes by file name; anything unknown measures 0.
    struct FixedUsage(HashMap<&'static str, u64>);

    impl DiskUsage for FixedUsage {
        fn size_kb(&self, path: &Path) -> io::Result<u64> {
            let name = path.file_name().unwrap().to_str().unwrap();
            Ok(self.0.get(name).copied().unwrap_or(0))
        }
    }

    fn chunk(sources: &[&str]) -> Chunk {
        Chunk {
            name: "stuff".to_string(),
            dest: PathBuf::from("stuff"),
            strategy: String::new(),
            sources: sources.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_docs_and_photos() {
        let home = TempDir::new().unwrap();
        fs::create_dir(home.path().join("docs")).unwrap();
        fs::create_dir(home.path().join("photos")).unwrap();
        let usage = FixedUsage(HashMap::from([("docs", 2000), ("photos", 500)]));

        let report = analyze(home.path(), &[chunk(&["docs"])], &usage).unwrap();

        assert_eq!(report.skipped, vec![PathBuf::from("photos")]);
        assert_eq!(
            report.covered,
            vec![CoveredEntry {
                relative_path: PathBuf::from("docs"),
                kind: PathKind::Directory,
                size_kb: 2000,
            }]
        );
        assert_eq!(report.total_kb, 2000);
        assert_eq!(report.total().mb(), 2.0);
        assert_eq!(report.total().to_string(), "2000K, 2.0M, 0.002G");
    }

    #[test]
    fn test_skipped_and_covered_partition_home() {
        let home = TempDir::new().unwrap();
        for d in ["a", "b", "c"] {
            fs::create_dir(home.path().join(d)).unwrap();
        }
        for f in ["x.txt", ".profile"] {
            fs::write(home.path().join(f), "1").unwrap();
        }
        let chunks = vec![chunk(&["c", "x.txt", "a/"]), chunk(&["c"])];

        let report = analyze(home.path(), &chunks, &FixedUsage(HashMap::new())).unwrap();
        assert!(report.malformed.is_empty());

        let skipped: BTreeSet<_> = report.skipped.iter().cloned().collect();
        let covered: BTreeSet<_> = report
            .covered
            .iter()
            .map(|c| c.relative_path.clone())
            .collect();
        assert!(skipped.is_disjoint(&covered));

        let all: BTreeSet<_> = fs::read_dir(home.path())
            .unwrap()
            .map(|e| PathBuf::from(e.unwrap().file_name()))
            .collect();
        let union: BTreeSet<_> = skipped.union(&covered).cloned().collect();
        assert_eq!(union, all);
        // duplicate "c" collapses
        assert_eq!(report.covered.len(), 3);
    }

    #[test]
    fn test_sorted_by_kind_then_path() {
        let home = TempDir::new().unwrap();
        fs::write(home.path().join("a.txt"), "").unwrap();
        fs::create_dir(home.path().join("z")).unwrap();
        fs::create_dir(home.path().join("m")).unwrap();

        let report = analyze(
            home.path(),
            &[chunk(&["a.txt", "z", "m"])],
            &FixedUsage(HashMap::new()),
        )
        .unwrap();
        let order: Vec<_> = report
            .covered
            .iter()
            .map(|c| c.relative_path.to_str().unwrap())
            .collect();
        assert_eq!(order, vec!["m", "z", "a.txt"]);
    }

    #[test]
    fn test_missing_paths_are_malformed_and_not_measured() {
        let home = TempDir::new().unwrap();
        fs::create_dir(home.path().join("docs")).unwrap();
        let usage = FixedUsage(HashMap::from([("ghost", 999), ("docs", 7)]));

        let report = analyze(home.path(), &[chunk(&["ghost", "docs"])], &usage).unwrap();

        assert_eq!(report.malformed, vec![PathBuf::from("ghost")]);
        assert_eq!(report.total_kb, 7);
    }

    #[cfg(unix)]
    #[test]
    fn test_links_are_reported_as_links() {
        let home = TempDir::new().unwrap();
        fs::create_dir(home.path().join("real")).unwrap();
        std::os::unix::fs::symlink(home.path().join("real"), home.path().join("alias")).unwrap();

        let report =
            analyze(home.path(), &[chunk(&["alias"])], &FixedUsage(HashMap::new())).unwrap();
        assert_eq!(report.covered[0].kind, PathKind::SymbolicLink);
        assert_eq!(report.skipped, vec![PathBuf::from("real")]);
    }

    #[test]
    fn test_parse_du_output() {
        assert_eq!(parse_du_output("2000\t/home/me/docs\n").unwrap(), 2000);
        assert!(parse_du_output("").is_err());
    }

    #[test]
    fn test_native_usage_counts_nested_files() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/data.bin"), vec![7u8; 64 * 1024]).unwrap();
        let kb = NativeUsage.size_kb(dir.path()).unwrap();
        assert!(kb >= 64, "{kb}");
    }
}
