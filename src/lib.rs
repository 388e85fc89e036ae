//! snackpack: a configuration-driven backup tool.
//!
//! A config names backup destinations (mount points tried in order) and
//! chunks of home-relative paths. [`destination::resolve`] picks the
//! destination root, [`sync::execute`] mirrors directories and copies files
//! into it chunk by chunk, and [`coverage::analyze`] reports which parts of
//! the home directory the config leaves out.

pub mod classify;
pub mod commands;
pub mod config;
pub mod constants;
pub mod coverage;
pub mod destination;
pub mod error;
pub mod file_util;
pub mod mirror;
pub mod path_util;
pub mod printer;
pub mod progress;
pub mod prompt;
pub mod sync;
pub mod sysexits;

pub use error::{Error, Result};
