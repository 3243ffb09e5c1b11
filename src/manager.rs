//! Read-modify-write operations on one udev rules file.
//!
//! Every operation reads the whole file, transforms the text in memory and
//! writes it back at most once. Validation and duplicate checks happen before
//! anything is written.

use crate::compose::{start_command, stop_command, write_compose_file};
use crate::error::{OctoError, Result};
use crate::rules::{
	DeviceProperties, DeviceRecord, append_rule, build_rule, build_start_stop_rule, list_names,
	list_paths, list_serials, parse_device_records, remove_by_name, remove_by_path,
	remove_by_serial,
};
use std::collections::BTreeMap;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Which identifying attribute of a new rule is already in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateAttribute {
	Name,
	Path,
	Serial,
}

impl DuplicateAttribute {
	pub fn as_str(&self) -> &'static str {
		match self {
			DuplicateAttribute::Name => "name",
			DuplicateAttribute::Path => "path",
			DuplicateAttribute::Serial => "serial",
		}
	}
}

impl fmt::Display for DuplicateAttribute {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Check whether a name, path or serial is already used in the rules text.
///
/// Checks run in that order and the first hit is returned. Both `devpath` and
/// `ID_PATH` values count as paths.
pub fn find_duplicate(
	text: &str,
	name: &str,
	paths: &[&str],
	serial: Option<&str>,
) -> Option<(DuplicateAttribute, String)> {
	if list_names(text).contains(&name) {
		return Some((DuplicateAttribute::Name, name.to_string()));
	}

	let used_paths = list_paths(text);
	if let Some(path) = paths.iter().find(|path| used_paths.contains(*path)) {
		return Some((DuplicateAttribute::Path, path.to_string()));
	}

	if let Some(serial) = serial
		&& list_serials(text).contains(&serial)
	{
		return Some((DuplicateAttribute::Serial, serial.to_string()));
	}

	None
}

/// A rule to add: the symlink name and the properties identifying the device.
#[derive(Debug, Clone)]
pub struct AddRequest {
	/// Symlink name.
	pub name: String,

	/// Identifying properties. Serial wins over devpath, devpath over path.
	pub properties: DeviceProperties,
}

impl AddRequest {
	fn check_duplicates(&self, text: &str) -> Result<()> {
		let paths: Vec<&str> = [&self.properties.devpath, &self.properties.path]
			.into_iter()
			.filter_map(|p| p.as_deref())
			.collect();

		match find_duplicate(text, &self.name, &paths, self.properties.serial.as_deref()) {
			Some((attribute, value)) => Err(OctoError::DuplicateIdentifier { attribute, value }),
			None => Ok(()),
		}
	}
}

/// Selects the rules to remove.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveTarget {
	/// Rules comparing against this serial number.
	Serial(String),

	/// Rules comparing against this `ID_PATH` or `devpath`.
	Path(String),

	/// The rule creating this symlink, including its remove line.
	Name(String),
}

/// One udev rules file on disk.
#[derive(Debug, Clone)]
pub struct RulesFile {
	path: PathBuf,
}

impl RulesFile {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		RulesFile { path: path.into() }
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Read the file. A missing file reads as empty.
	pub fn read(&self) -> Result<String> {
		match std::fs::read_to_string(&self.path) {
			Ok(text) => {
				tracing::debug!(path = %self.path.display(), bytes = text.len(), "read rules file");
				Ok(text)
			}
			Err(e) if e.kind() == ErrorKind::NotFound => {
				tracing::debug!(path = %self.path.display(), "rules file does not exist yet");
				Ok(String::new())
			}
			Err(source) => Err(OctoError::RulesFileRead {
				path: self.path.clone(),
				source,
			}),
		}
	}

	/// Replace the file content.
	pub fn write(&self, text: &str) -> Result<()> {
		std::fs::write(&self.path, text).map_err(|source| OctoError::RulesFileWrite {
			path: self.path.clone(),
			source,
		})?;
		tracing::debug!(path = %self.path.display(), bytes = text.len(), "wrote rules file");
		Ok(())
	}

	/// All named rules in the file.
	pub fn records(&self) -> Result<BTreeMap<String, DeviceRecord>> {
		Ok(parse_device_records(&self.read()?))
	}

	/// Add a plain symlink rule.
	///
	/// Fails without writing if no identifier is given or, unless `force` is
	/// set, if the name, path or serial is already used.
	pub fn add_rule(&self, request: &AddRequest, force: bool) -> Result<()> {
		let rule = build_rule(&request.name, &request.properties)?;
		let text = self.read()?;
		if !force {
			request.check_duplicates(&text)?;
		}

		self.write(&append_rule(&text, &rule))?;
		tracing::info!(name = %request.name, path = %self.path.display(), "added rule");
		Ok(())
	}

	/// Add a connect/disconnect rule pair that starts and stops an OctoPrint
	/// compose project on `port`, writing the compose file to `compose_file`.
	///
	/// Only serial and path identify the device; a devpath is rejected. A
	/// relative `compose_file` is resolved against the current directory, since
	/// udev runs the commands elsewhere. The rule is built and checked before
	/// the compose file or the rules file is written. Returns the absolute
	/// compose file path.
	pub fn add_compose_rule(
		&self,
		request: &AddRequest,
		port: u16,
		compose_file: &Path,
		force: bool,
	) -> Result<PathBuf> {
		if request.properties.devpath.is_some() {
			return Err(OctoError::DockerWithDevpath);
		}

		let compose_file =
			std::path::absolute(compose_file).map_err(|source| OctoError::ComposeWrite {
				path: compose_file.to_path_buf(),
				source,
			})?;
		let compose_file = compose_file.as_path();

		let rule = build_start_stop_rule(
			&request.name,
			&start_command(compose_file),
			&stop_command(compose_file),
			&request.properties,
		)?;
		let text = self.read()?;
		if !force {
			request.check_duplicates(&text)?;
		}

		write_compose_file(port, &request.name, compose_file)?;
		self.write(&append_rule(&text, &rule))?;
		tracing::info!(
			name = %request.name,
			path = %self.path.display(),
			compose = %compose_file.display(),
			"added compose rule"
		);
		Ok(compose_file.to_path_buf())
	}

	/// Remove the rules selected by `target`.
	///
	/// Returns the number of removed lines. The file is only written when
	/// something was removed.
	pub fn remove_rule(&self, target: &RemoveTarget) -> Result<usize> {
		let text = self.read()?;
		let updated = match target {
			RemoveTarget::Serial(serial) => remove_by_serial(&text, serial),
			RemoveTarget::Path(path) => remove_by_path(&text, path),
			RemoveTarget::Name(name) => remove_by_name(&text, name),
		};

		if updated == text {
			tracing::info!(?target, "no matching rule");
			return Ok(0);
		}

		let removed = count_lines(&text) - count_lines(&updated);
		self.write(&updated)?;
		tracing::info!(?target, removed, "removed rule lines");
		Ok(removed)
	}
}

fn count_lines(text: &str) -> usize {
	text.split_inclusive('\n').count()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::rules::parser::tests::SAMPLE_RULES;

	fn rules_file(dir: &Path, content: &str) -> RulesFile {
		let path = dir.join("99-serial.rules");
		std::fs::write(&path, content).unwrap();
		RulesFile::new(path)
	}

	fn request(name: &str, serial: Option<&str>, devpath: Option<&str>, path: Option<&str>) -> AddRequest {
		AddRequest {
			name: name.to_string(),
			properties: DeviceProperties {
				serial: serial.map(str::to_string),
				devpath: devpath.map(str::to_string),
				path: path.map(str::to_string),
				..Default::default()
			},
		}
	}

	#[test]
	fn test_find_duplicate_order() {
		assert_eq!(
			find_duplicate(SAMPLE_RULES, "Printer1", &["1.5"], Some("kise")),
			Some((DuplicateAttribute::Name, "Printer1".to_string()))
		);
		assert_eq!(
			find_duplicate(SAMPLE_RULES, "New", &["UsbPathTo2"], Some("kise")),
			Some((DuplicateAttribute::Path, "UsbPathTo2".to_string()))
		);
		assert_eq!(
			find_duplicate(SAMPLE_RULES, "New", &[], Some("kise")),
			Some((DuplicateAttribute::Serial, "kise".to_string()))
		);
		assert_eq!(find_duplicate(SAMPLE_RULES, "New", &["9.9"], Some("new")), None);
	}

	#[test]
	fn test_read_missing_file_is_empty() {
		let temp_dir = tempfile::tempdir().unwrap();
		let file = RulesFile::new(temp_dir.path().join("missing.rules"));
		assert_eq!(file.read().unwrap(), "");
		assert!(file.records().unwrap().is_empty());
	}

	#[test]
	fn test_add_rule_appends() {
		let temp_dir = tempfile::tempdir().unwrap();
		let file = rules_file(temp_dir.path(), SAMPLE_RULES);

		file.add_rule(&request("Printer9", Some("abc"), None, None), false)
			.unwrap();

		let text = file.read().unwrap();
		assert!(text.starts_with(SAMPLE_RULES));
		assert!(text.ends_with("SUBSYSTEM==\"tty\", ATTRS{serial}==\"abc\", SYMLINK+=\"Printer9\"\n"));
		assert_eq!(file.records().unwrap().len(), 9);
	}

	#[test]
	fn test_add_rule_duplicate_leaves_file_untouched() {
		let temp_dir = tempfile::tempdir().unwrap();
		let file = rules_file(temp_dir.path(), SAMPLE_RULES);

		let result = file.add_rule(&request("Printer9", None, Some("1.1"), None), false);
		match result.unwrap_err() {
			OctoError::DuplicateIdentifier { attribute, value } => {
				assert_eq!(attribute, DuplicateAttribute::Path);
				assert_eq!(value, "1.1");
			}
			_ => panic!("Expected DuplicateIdentifier error"),
		}
		assert_eq!(file.read().unwrap(), SAMPLE_RULES);
	}

	#[test]
	fn test_add_rule_force_allows_duplicate() {
		let temp_dir = tempfile::tempdir().unwrap();
		let file = rules_file(temp_dir.path(), SAMPLE_RULES);

		file.add_rule(&request("Printer1", Some("kise"), None, None), true)
			.unwrap();
		assert_eq!(list_names(&file.read().unwrap()).len(), 9);
	}

	#[test]
	fn test_add_rule_missing_identifier() {
		let temp_dir = tempfile::tempdir().unwrap();
		let file = rules_file(temp_dir.path(), SAMPLE_RULES);

		let result = file.add_rule(&request("Printer9", None, None, None), true);
		assert!(matches!(result, Err(OctoError::MissingIdentifier { .. })));
		assert_eq!(file.read().unwrap(), SAMPLE_RULES);
	}

	#[test]
	fn test_add_compose_rule() {
		let temp_dir = tempfile::tempdir().unwrap();
		let file = rules_file(temp_dir.path(), "");
		let compose = temp_dir.path().join("compose/docker-compose.Printer9.yml");

		let written = file
			.add_compose_rule(&request("Printer9", None, None, Some("pci-1")), 5001, &compose, false)
			.unwrap();
		assert_eq!(written, compose);

		let text = file.read().unwrap();
		assert_eq!(text.lines().count(), 2);
		assert!(text.contains(&format!("RUN+=\"docker compose -f {} up -d\"", compose.display())));
		assert!(text.contains(&format!("RUN+=\"docker compose -f {} stop\"", compose.display())));

		let compose_content = std::fs::read_to_string(&compose).unwrap();
		assert!(compose_content.contains("- 5001:80"));
		assert!(compose_content.contains("- /dev/Printer9:/dev/ttyUSB0"));

		assert_eq!(file.remove_rule(&RemoveTarget::Name("Printer9".to_string())).unwrap(), 2);
		assert_eq!(file.read().unwrap(), "");
	}

	#[test]
	fn test_add_compose_rule_rejects_devpath() {
		let temp_dir = tempfile::tempdir().unwrap();
		let file = rules_file(temp_dir.path(), "");
		let compose = temp_dir.path().join("docker-compose.yml");

		let result = file.add_compose_rule(&request("P", None, Some("1.1"), None), 5000, &compose, false);
		assert!(matches!(result, Err(OctoError::DockerWithDevpath)));
		assert!(!compose.exists());
	}

	#[test]
	fn test_add_compose_rule_duplicate_writes_nothing() {
		let temp_dir = tempfile::tempdir().unwrap();
		let file = rules_file(temp_dir.path(), SAMPLE_RULES);
		let compose = temp_dir.path().join("docker-compose.yml");

		let result = file.add_compose_rule(&request("New", Some("kpl6"), None, None), 5000, &compose, false);
		assert!(matches!(
			result,
			Err(OctoError::DuplicateIdentifier {
				attribute: DuplicateAttribute::Serial,
				..
			})
		));
		assert!(!compose.exists());
		assert_eq!(file.read().unwrap(), SAMPLE_RULES);
	}

	#[test]
	fn test_remove_rule_targets() {
		let temp_dir = tempfile::tempdir().unwrap();
		let file = rules_file(temp_dir.path(), SAMPLE_RULES);

		assert_eq!(file.remove_rule(&RemoveTarget::Serial("kise".to_string())).unwrap(), 2);
		assert_eq!(file.remove_rule(&RemoveTarget::Path("1.5".to_string())).unwrap(), 1);
		assert_eq!(file.remove_rule(&RemoveTarget::Name("Printer5".to_string())).unwrap(), 2);

		let records = file.records().unwrap();
		assert_eq!(records.len(), 5);
		assert!(!records.contains_key("Printer3"));
		assert!(!records.contains_key("Printer8"));
		assert!(!records.contains_key("Printer5"));
	}

	#[test]
	fn test_remove_rule_no_match_keeps_file() {
		let temp_dir = tempfile::tempdir().unwrap();
		let file = rules_file(temp_dir.path(), SAMPLE_RULES);

		let removed = file
			.remove_rule(&RemoveTarget::Serial("nonExistentSerial".to_string()))
			.unwrap();
		assert_eq!(removed, 0);
		assert_eq!(file.read().unwrap(), SAMPLE_RULES);
	}
}
