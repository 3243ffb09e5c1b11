//! Configuration loading and parsing for octodocker.
//!
//! This module handles:
//! - TOML config file parsing
//! - Config file discovery (command line, environment, user config dir)
//! - Built-in defaults for the rules file and compose directory

pub mod discovery;
pub mod parser;
pub mod types;

pub use discovery::{
	CONFIG_ENV_VAR, ConfigSource, discover_config, load_config, resolve_config_source,
	user_config_path,
};
pub use parser::{parse_config_file, parse_config_str};
pub use types::{Config, DEFAULT_RULES_FILE, LoadedConfig};
