use crate::error::{OctoError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Rules file used when neither the config nor the command line names one.
pub const DEFAULT_RULES_FILE: &str = "/etc/udev/rules.d/99-serial.rules";

/// Top-level configuration from a `config.toml` file.
///
/// Every key is optional; missing keys fall back to the built-in defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
	/// udev rules file to read and modify.
	pub rules_file: Option<PathBuf>,

	/// Directory for generated compose files.
	pub compose_dir: Option<PathBuf>,
}

/// A configuration with the file it was loaded from, if any.
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
	/// The parsed configuration.
	pub config: Config,

	/// The path this config was loaded from; `None` means built-in defaults.
	pub path: Option<PathBuf>,
}

impl Config {
	/// Validate that configured paths are usable.
	pub fn validate(&self, path: &Path) -> Result<()> {
		let paths = [
			("rules-file", &self.rules_file),
			("compose-dir", &self.compose_dir),
		];

		for (key, value) in paths {
			if value.as_ref().is_some_and(|p| p.as_os_str().is_empty()) {
				return Err(OctoError::InvalidConfig {
					path: path.to_path_buf(),
					key,
				});
			}
		}
		Ok(())
	}

	/// The rules file, falling back to [`DEFAULT_RULES_FILE`].
	pub fn rules_file(&self) -> PathBuf {
		self.rules_file
			.clone()
			.unwrap_or_else(|| PathBuf::from(DEFAULT_RULES_FILE))
	}

	/// The compose directory, falling back to `<data dir>/octodocker/compose`.
	pub fn compose_dir(&self) -> Result<PathBuf> {
		if let Some(ref dir) = self.compose_dir {
			return Ok(dir.clone());
		}
		let data_dir = dirs::data_dir().ok_or(OctoError::DataDirectoryNotFound)?;
		Ok(data_dir.join("octodocker").join("compose"))
	}
}
