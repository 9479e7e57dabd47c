// navview - Shared Library
// Ambient pieces used by every navview crate: logging setup and the
// INI-style configuration reader.

pub mod config;
pub mod log;

/// Default configuration file name for the command-line tools
pub const DEFAULT_CONFIG_FILE: &str = "navtool.conf";

/// Environment variable prefix for configuration overrides
pub const DEFAULT_ENV_PREFIX: &str = "NavTool_";
