use std::path::PathBuf;

/// Library-level structured errors for octodocker.
///
/// Use `thiserror` for structured errors that library consumers can match on.
/// The CLI binary wraps these with `anyhow` for rich context chains.
#[derive(Debug, thiserror::Error)]
pub enum OctoError {
	#[error("Either {expected} has to be specified")]
	MissingIdentifier { expected: &'static str },

	#[error("Invalid value for {field}: {value:?} (quotes and line breaks are not allowed)")]
	InvalidValue { field: &'static str, value: String },

	#[error("{attribute} is already in use: {value}")]
	DuplicateIdentifier {
		attribute: crate::manager::DuplicateAttribute,
		value: String,
	},

	#[error("Docker is not supported when using devpath")]
	DockerWithDevpath,

	#[error("Failed to read rules file: {path}")]
	RulesFileRead {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to write rules file: {path}")]
	RulesFileWrite {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to write compose file: {path}")]
	ComposeWrite {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Config file not found: {path}")]
	ConfigNotFound { path: PathBuf },

	#[error("Failed to read config file: {path}")]
	ConfigRead {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to parse config file: {path}")]
	ConfigParse {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	#[error("Invalid value for `{key}` in config file: {path}")]
	InvalidConfig { path: PathBuf, key: &'static str },

	#[error("Failed to enumerate udev devices")]
	DeviceScan {
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to resolve the user config directory")]
	ConfigDirectoryNotFound,

	#[error("Failed to resolve a data directory for compose files")]
	DataDirectoryNotFound,
}

/// Result type alias using OctoError.
pub type Result<T> = std::result::Result<T, OctoError>;
