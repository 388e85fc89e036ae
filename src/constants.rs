/// Package name, also used as the config directory name.
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
/// The only accepted value of a config's `type` field.
pub const CONFIG_TYPE: &str = "jbackup.conf.v1";
/// Extension of config files in the config directory.
pub const CONFIG_EXTENSION: &str = "toml";
/// Message recorded for sources that are neither a file nor a directory.
pub const NOT_FILE_OR_DIR: &str = "source is neither file nor directory";
