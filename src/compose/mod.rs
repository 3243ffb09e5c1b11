//! Docker Compose file generation for octodocker.
//!
//! This module handles:
//! - Rendering the OctoPrint compose template for a device
//! - Choosing and writing the compose file
//! - Building the start/stop commands run by udev

use crate::error::{OctoError, Result};
use std::path::{Path, PathBuf};

/// Render the OctoPrint compose file for a device symlink.
///
/// The container serves OctoPrint on host port `port` and sees the printer
/// at `/dev/ttyUSB0`.
pub fn render_compose(port: u16, device: &str) -> String {
	format!(
		r#"version: '2.4'
name: {device}

services:
  octoprint:
    image: octoprint/octoprint
    restart: unless-stopped
    ports:
      - {port}:80
    devices:
      - /dev/{device}:/dev/ttyUSB0
    volumes:
      - octoprint:/octoprint

volumes:
  octoprint:
"#
	)
}

/// Resolve where the compose file for `device` goes.
///
/// An explicit path wins; otherwise `docker-compose.<device>.yml` inside `compose_dir`.
pub fn compose_file_path(device: &str, explicit: Option<&Path>, compose_dir: &Path) -> PathBuf {
	match explicit {
		Some(path) => path.to_path_buf(),
		None => compose_dir.join(format!("docker-compose.{device}.yml")),
	}
}

/// Write the compose file for `device` to `path`, creating parent directories.
pub fn write_compose_file(port: u16, device: &str, path: &Path) -> Result<()> {
	let to_error = |source| OctoError::ComposeWrite {
		path: path.to_path_buf(),
		source,
	};

	if let Some(parent) = path.parent()
		&& !parent.as_os_str().is_empty()
	{
		std::fs::create_dir_all(parent).map_err(to_error)?;
	}
	std::fs::write(path, render_compose(port, device)).map_err(to_error)?;

	tracing::info!(path = %path.display(), device, port, "wrote compose file");
	Ok(())
}

/// Command that starts the compose project in the background.
pub fn start_command(compose_file: &Path) -> String {
	format!("docker compose -f {} up -d", compose_file.display())
}

/// Command that stops the compose project.
pub fn stop_command(compose_file: &Path) -> String {
	format!("docker compose -f {} stop", compose_file.display())
}

#[cfg(test)]
mod tests {
	use super::*;

	const PRINTER1_COMPOSE: &str = "version: '2.4'
name: Printer1

services:
  octoprint:
    image: octoprint/octoprint
    restart: unless-stopped
    ports:
      - 5000:80
    devices:
      - /dev/Printer1:/dev/ttyUSB0
    volumes:
      - octoprint:/octoprint

volumes:
  octoprint:
";

	#[test]
	fn test_render_compose() {
		assert_eq!(render_compose(5000, "Printer1"), PRINTER1_COMPOSE);
	}

	#[test]
	fn test_compose_file_path() {
		let dir = Path::new("/var/lib/octodocker");
		assert_eq!(
			compose_file_path("Printer1", None, dir),
			PathBuf::from("/var/lib/octodocker/docker-compose.Printer1.yml")
		);
		assert_eq!(
			compose_file_path("Printer1", Some(Path::new("/tmp/p1.yml")), dir),
			PathBuf::from("/tmp/p1.yml")
		);
	}

	#[test]
	fn test_write_compose_file_creates_dirs() {
		let temp_dir = tempfile::tempdir().unwrap();
		let path = temp_dir.path().join("nested/dir/docker-compose.Printer1.yml");

		write_compose_file(5000, "Printer1", &path).unwrap();

		let content = std::fs::read_to_string(&path).unwrap();
		assert_eq!(content, PRINTER1_COMPOSE);
	}

	#[test]
	fn test_start_stop_commands() {
		let path = Path::new("/srv/docker-compose.Printer1.yml");
		assert_eq!(
			start_command(path),
			"docker compose -f /srv/docker-compose.Printer1.yml up -d"
		);
		assert_eq!(
			stop_command(path),
			"docker compose -f /srv/docker-compose.Printer1.yml stop"
		);
	}
}
