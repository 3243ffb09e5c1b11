use crate::config::parser::parse_config_file;
use crate::config::types::LoadedConfig;
use crate::error::{OctoError, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Environment variable naming a config file.
pub const CONFIG_ENV_VAR: &str = "OCTODOCKER_CONFIG";

/// Where the effective config comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
	/// A file that must exist (command line or environment).
	Required(PathBuf),

	/// The user config file, used only if it exists.
	Optional(PathBuf),

	/// Built-in defaults only.
	Defaults,
}

/// Pick the config source.
///
/// The order is:
/// 1. An explicit path (`--config`)
/// 2. The `OCTODOCKER_CONFIG` environment variable, if non-empty
/// 3. `<user config dir>/octodocker/config.toml`
/// 4. Built-in defaults when no user config dir can be resolved
pub fn resolve_config_source(
	explicit: Option<&Path>,
	env_value: Option<OsString>,
	user_path: Option<PathBuf>,
) -> ConfigSource {
	if let Some(path) = explicit {
		return ConfigSource::Required(path.to_path_buf());
	}
	if let Some(value) = env_value.filter(|v| !v.is_empty()) {
		return ConfigSource::Required(PathBuf::from(value));
	}
	match user_path {
		Some(path) => ConfigSource::Optional(path),
		None => ConfigSource::Defaults,
	}
}

/// Load the config from a resolved source.
pub fn load_config(source: &ConfigSource) -> Result<LoadedConfig> {
	let path = match source {
		ConfigSource::Required(path) => {
			if !path.exists() {
				return Err(OctoError::ConfigNotFound { path: path.clone() });
			}
			path
		}
		ConfigSource::Optional(path) if path.exists() => path,
		ConfigSource::Optional(_) | ConfigSource::Defaults => {
			tracing::debug!("no config file, using defaults");
			return Ok(LoadedConfig::default());
		}
	};

	let config = parse_config_file(path)?;
	tracing::debug!(path = %path.display(), "loaded config");
	Ok(LoadedConfig {
		config,
		path: Some(path.clone()),
	})
}

/// Convenience function to resolve and load the effective config.
pub fn discover_config(explicit: Option<&Path>) -> Result<LoadedConfig> {
	let source = resolve_config_source(
		explicit,
		std::env::var_os(CONFIG_ENV_VAR),
		user_config_path().ok(),
	);
	load_config(&source)
}

/// Get the path to the user's config file.
pub fn user_config_path() -> Result<PathBuf> {
	let config_dir = dirs::config_dir().ok_or(OctoError::ConfigDirectoryNotFound)?;
	Ok(config_dir.join("octodocker").join("config.toml"))
}
