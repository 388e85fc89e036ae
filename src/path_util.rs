use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Expands a leading `~` or `$HOME` to the user's home directory.
pub fn expand_home(input: &Path, home: &Path) -> PathBuf {
    let Some(s) = input.to_str() else {
        return input.to_path_buf();
    };
    for prefix in ["~", "$HOME"] {
        if s == prefix {
            return home.to_path_buf();
        }
        if let Some(rest) = s.strip_prefix(prefix).and_then(|r| r.strip_prefix('/')) {
            return home.join(rest);
        }
    }
    input.to_path_buf()
}

/// The home directory to back up: `explicit` if given, else the user's.
pub fn home_dir(explicit: Option<PathBuf>) -> Result<PathBuf> {
    match explicit {
        Some(home) => Ok(home),
        None => dirs::home_dir().ok_or(Error::NoHomeDir),
    }
}
