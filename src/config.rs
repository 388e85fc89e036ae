//! Backup configuration.
//!
//! A config file describes where a backup may go (`look_for_dests`) and what
//! goes into it (`sources`, one table per chunk). Parsing is strict: the
//! `type` tag is checked first, then the document is read into raw records and
//! converted into the validated [`Config`] model. Unknown keys in chunk and
//! mount tables are rejected. Other destination kinds are kept as written and
//! never interpreted.

use crate::constants::{CONFIG_EXTENSION, CONFIG_TYPE, PKG_NAME};
use crate::error::{Error, Result};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// A validated backup configuration.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Config {
    /// Schema tag, always [`CONFIG_TYPE`].
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Destination candidates, tried in order.
    #[serde(rename = "look_for_dests")]
    pub destinations: Vec<Destination>,
    /// Chunks, synced in order.
    #[serde(rename = "sources")]
    pub chunks: Vec<Chunk>,
}

/// A place a backup may be written to.
#[derive(Debug, Clone, PartialEq)]
pub enum Destination {
    /// `path` below the mount point `mount`, used only while `mount` is mounted.
    Mount { mount: PathBuf, path: PathBuf },
    /// A destination kind this version does not know how to probe. `fields`
    /// holds the rest of the record untouched.
    Unsupported { kind: String, fields: toml::Table },
}

// Written back in the shape it was read: `type` first, then the kind's own keys.
impl Serialize for Destination {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Destination::Mount { mount, path } => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("type", "mount")?;
                map.serialize_entry("mount", mount)?;
                map.serialize_entry("path", path)?;
                map.end()
            }
            Destination::Unsupported { kind, fields } => {
                let mut map = serializer.serialize_map(Some(fields.len() + 1))?;
                map.serialize_entry("type", kind)?;
                for (key, value) in fields {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

/// A named group of home-relative paths sharing one destination subdirectory.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub name: String,
    /// Subdirectory of the destination root.
    pub dest: PathBuf,
    /// Reserved; not interpreted yet.
    pub strategy: String,
    /// Paths relative to the home directory, in sync order. May repeat.
    pub sources: Vec<String>,
}

// Unknown top-level keys are ignored.
#[derive(Deserialize)]
struct RawConfig {
    #[serde(rename = "type")]
    kind: String,
    title: Option<String>,
    #[serde(default)]
    look_for_dests: Vec<RawDestination>,
    sources: Vec<RawChunk>,
}

#[derive(Deserialize)]
struct RawDestination {
    #[serde(rename = "type")]
    kind: String,
    #[serde(flatten)]
    rest: toml::Table,
}

/// The keys of a `mount` record. Only this kind is parsed strictly.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawMount {
    mount: Option<PathBuf>,
    path: Option<PathBuf>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawChunk {
    name: String,
    dest: PathBuf,
    #[serde(default)]
    strategy: String,
    sources: Option<Vec<String>>,
    #[serde(rename = "sources__ARR")]
    sources_block: Option<String>,
}

impl TryFrom<RawDestination> for Destination {
    type Error = Error;

    fn try_from(raw: RawDestination) -> Result<Self> {
        if raw.kind != "mount" {
            return Ok(Destination::Unsupported {
                kind: raw.kind,
                fields: raw.rest,
            });
        }
        let mount: RawMount = toml::Value::Table(raw.rest).try_into()?;
        match (mount.mount, mount.path) {
            (Some(mount), Some(path)) => Ok(Destination::Mount { mount, path }),
            (None, _) => Err(Error::InvalidConfig(
                "mount destination is missing 'mount'".to_string(),
            )),
            (_, None) => Err(Error::InvalidConfig(
                "mount destination is missing 'path'".to_string(),
            )),
        }
    }
}

impl TryFrom<RawChunk> for Chunk {
    type Error = Error;

    fn try_from(raw: RawChunk) -> Result<Self> {
        let sources = match (raw.sources, raw.sources_block) {
            (Some(list), None) => list,
            (None, Some(block)) => split_sources_block(&block),
            (Some(_), Some(_)) => {
                return Err(Error::InvalidConfig(format!(
                    "chunk '{}' sets both 'sources' and 'sources__ARR'",
                    raw.name
                )));
            }
            (None, None) => {
                return Err(Error::InvalidConfig(format!(
                    "chunk '{}' has no 'sources'",
                    raw.name
                )));
            }
        };
        check_relative(&raw.name, "dest", &raw.dest)?;
        for source in &sources {
            check_relative(&raw.name, "source", Path::new(source))?;
        }
        Ok(Chunk {
            name: raw.name,
            dest: raw.dest,
            strategy: raw.strategy,
            sources,
        })
    }
}

/// Chunk paths are joined onto the home directory and the destination root,
/// and a mirror deletes below its target. Neither may escape its base.
fn check_relative(chunk: &str, what: &str, path: &Path) -> Result<()> {
    let escapes = path.components().any(|c| {
        matches!(c, Component::RootDir | Component::Prefix(_) | Component::ParentDir)
    });
    if escapes {
        return Err(Error::InvalidConfig(format!(
            "chunk '{chunk}': {what} '{}' must be a relative path inside its base",
            path.display()
        )));
    }
    Ok(())
}

impl Config {
    /// Parses a config from TOML text.
    ///
    /// The `type` tag is checked before anything else is interpreted, so a
    /// document of the wrong kind is reported as such even if it is
    /// otherwise malformed.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let table: toml::Table = toml::from_str(s)?;
        match table.get("type").and_then(|v| v.as_str()) {
            Some(CONFIG_TYPE) => {}
            Some(other) => {
                return Err(Error::SchemaMismatch {
                    expected: CONFIG_TYPE,
                    found: format!("'{other}'"),
                });
            }
            None => {
                return Err(Error::SchemaMismatch {
                    expected: CONFIG_TYPE,
                    found: "nothing".to_string(),
                });
            }
        }

        let raw: RawConfig = toml::from_str(s)?;
        Ok(Config {
            kind: raw.kind,
            title: raw.title,
            destinations: raw
                .look_for_dests
                .into_iter()
                .map(Destination::try_from)
                .collect::<Result<_>>()?,
            chunks: raw
                .sources
                .into_iter()
                .map(Chunk::try_from)
                .collect::<Result<_>>()?,
        })
    }

    /// Reads and parses a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::ConfigNotFound(path.to_path_buf()),
            _ => Error::Io(e),
        })?;
        Self::from_toml_str(&text)
    }

    /// The first `mount` destination, if any.
    pub fn first_mount(&self) -> Option<&Path> {
        self.destinations.iter().find_map(|d| match d {
            Destination::Mount { mount, .. } => Some(mount.as_path()),
            Destination::Unsupported { .. } => None,
        })
    }
}

/// Splits a newline-delimited source block into paths.
///
/// Lines are trimmed; blank lines and `#` comments are dropped.
pub fn split_sources_block(block: &str) -> Vec<String> {
    block
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(String::from)
        .collect()
}

/// Returns the configuration directory for the application, platform-specific.
#[cfg(not(target_os = "macos"))]
pub fn config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().ok_or(Error::NoHomeDir)?;
    Ok(config_dir.join(PKG_NAME))
}

/// Returns the configuration directory for the application, platform-specific.
#[cfg(target_os = "macos")]
pub fn config_dir() -> Result<PathBuf> {
    let home_dir = dirs::home_dir().ok_or(Error::NoHomeDir)?;
    Ok(home_dir.join(".config").join(PKG_NAME))
}

/// Lists the config files in `dir`, sorted by file name.
pub fn list_config_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::NoConfigDir(dir.to_path_buf()));
    }
    let mut files = vec![];
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == CONFIG_EXTENSION) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Picks the default config file: the first one in `dir` by name.
pub fn default_config_file(dir: &Path) -> Result<PathBuf> {
    list_config_files(dir)?
        .into_iter()
        .next()
        .ok_or_else(|| Error::ConfigNotFound(dir.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"
type = "jbackup.conf.v1"
title = "laptop"

[[look_for_dests]]
type = "mount"
mount = "/mnt/backup"
path = "data"

[[look_for_dests]]
type = "ssh"

[[sources]]
name = "stuff"
dest = "stuff"
sources = ["docs", "notes.txt", "docs"]

[[sources]]
name = "dotfiles"
dest = "dot"
strategy = "mirror"
sources__ARR = """
    .bashrc
    # not this one
    .config/nvim

"""
"#;

    #[test]
    fn test_parse_sample() {
        let config = Config::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.kind, CONFIG_TYPE);
        assert_eq!(config.title.as_deref(), Some("laptop"));
        assert_eq!(
            config.destinations,
            vec![
                Destination::Mount {
                    mount: PathBuf::from("/mnt/backup"),
                    path: PathBuf::from("data"),
                },
                Destination::Unsupported {
                    kind: "ssh".to_string(),
                    fields: toml::Table::new(),
                },
            ]
        );
        assert_eq!(config.chunks.len(), 2);
        assert_eq!(config.chunks[0].strategy, "");
        // duplicates are kept
        assert_eq!(config.chunks[0].sources, vec!["docs", "notes.txt", "docs"]);
        assert_eq!(config.chunks[1].strategy, "mirror");
        assert_eq!(config.chunks[1].sources, vec![".bashrc", ".config/nvim"]);
        assert_eq!(config.first_mount(), Some(Path::new("/mnt/backup")));
    }

    #[test]
    fn test_wrong_type_is_rejected_before_shape_checks() {
        // `sources` is malformed too, but the tag must win.
        let err = Config::from_toml_str("type = \"other.v2\"\nsources = 3\n").unwrap_err();
        assert!(matches!(err, Error::SchemaMismatch { .. }), "{err}");

        let err = Config::from_toml_str("sources = []\n").unwrap_err();
        assert!(matches!(err, Error::SchemaMismatch { .. }), "{err}");
    }

    #[test]
    fn test_chunk_shape_errors() {
        let both = r#"
type = "jbackup.conf.v1"
[[sources]]
name = "a"
dest = "a"
sources = ["x"]
sources__ARR = "y"
"#;
        assert!(matches!(
            Config::from_toml_str(both).unwrap_err(),
            Error::InvalidConfig(_)
        ));

        let neither = r#"
type = "jbackup.conf.v1"
[[sources]]
name = "a"
dest = "a"
"#;
        assert!(matches!(
            Config::from_toml_str(neither).unwrap_err(),
            Error::InvalidConfig(_)
        ));

        let unknown = r#"
type = "jbackup.conf.v1"
[[sources]]
name = "a"
dest = "a"
sources = []
colour = "blue"
"#;
        assert!(matches!(
            Config::from_toml_str(unknown).unwrap_err(),
            Error::Toml(_)
        ));
    }

    #[test]
    fn test_mount_destination_requires_path() {
        let s = r#"
type = "jbackup.conf.v1"
sources = []
[[look_for_dests]]
type = "mount"
mount = "/mnt/usb"
"#;
        let err = Config::from_toml_str(s).unwrap_err();
        assert!(err.to_string().contains("'path'"));
    }

    #[test]
    fn test_split_sources_block() {
        let block = "\n  a \n#b\n\n  # c\nd/e\n";
        assert_eq!(split_sources_block(block), vec!["a", "d/e"]);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = Config::load(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, Error::ConfigNotFound(_)));
    }

    #[test]
    fn test_default_config_file_is_first_toml_by_name() {
        let dir = TempDir::new().unwrap();
        for name in ["b.toml", "a.toml", "notes.txt"] {
            let mut f = File::create(dir.path().join(name)).unwrap();
            f.write_all(SAMPLE.as_bytes()).unwrap();
        }
        let files = list_config_files(dir.path()).unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(default_config_file(dir.path()).unwrap(), dir.path().join("a.toml"));

        let missing = dir.path().join("missing");
        assert!(matches!(
            list_config_files(&missing).unwrap_err(),
            Error::NoConfigDir(_)
        ));
    }

    #[test]
    fn test_examine_output_uses_file_field_names() {
        let config = Config::from_toml_str(SAMPLE).unwrap();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("type = \"jbackup.conf.v1\""));
        assert!(toml_str.contains("look_for_dests"));
        assert!(toml_str.contains(".config/nvim"));
    }

    #[test]
    fn test_other_destination_kinds_keep_their_own_keys() {
        let s = r#"
type = "jbackup.conf.v1"
sources = []

[[look_for_dests]]
type = "ssh"
host = "backup.example"
port = 22

[[look_for_dests]]
type = "mount"
mount = "/mnt/usb"
path = "data"
"#;
        let config = Config::from_toml_str(s).unwrap();
        assert_eq!(config.first_mount(), Some(Path::new("/mnt/usb")));
        let Destination::Unsupported { kind, fields } = &config.destinations[0] else {
            panic!("expected an unsupported destination");
        };
        assert_eq!(kind, "ssh");
        assert_eq!(fields.get("host").and_then(|v| v.as_str()), Some("backup.example"));

        let shown = toml::to_string_pretty(&config).unwrap();
        assert!(shown.contains("type = \"ssh\""), "{shown}");
        assert!(shown.contains("host = \"backup.example\""), "{shown}");
        assert!(!shown.contains("unsupported"), "{shown}");
    }

    #[test]
    fn test_mount_destination_rejects_unknown_keys() {
        let s = r#"
type = "jbackup.conf.v1"
sources = []
[[look_for_dests]]
type = "mount"
mount = "/mnt/usb"
path = "data"
host = "nope"
"#;
        assert!(matches!(
            Config::from_toml_str(s).unwrap_err(),
            Error::Toml(_)
        ));
    }

    #[test]
    fn test_unknown_top_level_keys_are_ignored() {
        let s = "type = \"jbackup.conf.v1\"\ndescription = \"spare\"\nsources = []\n";
        let config = Config::from_toml_str(s).unwrap();
        assert!(config.chunks.is_empty());
    }

    #[test]
    fn test_chunk_paths_must_stay_inside_their_base() {
        let chunk = |dest: &str, sources: &str| {
            format!(
                "type = \"jbackup.conf.v1\"\n[[sources]]\nname = \"a\"\ndest = \"{dest}\"\nsources = [{sources}]\n"
            )
        };
        for (dest, sources) in [
            ("/abs", "\"docs\""),
            ("../up", "\"docs\""),
            ("a/../../b", "\"docs\""),
            ("ok", "\"/etc\""),
            ("ok", "\"docs\", \"../other\""),
        ] {
            let err = Config::from_toml_str(&chunk(dest, sources)).unwrap_err();
            assert!(matches!(err, Error::InvalidConfig(_)), "{dest} {sources}: {err}");
        }

        let config = Config::from_toml_str(&chunk("./home/dot", "\".config/nvim\"")).unwrap();
        assert_eq!(config.chunks[0].sources, vec![".config/nvim"]);
    }
}
