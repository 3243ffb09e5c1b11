use crate::rules::clause::{Clause, Field, scan_clauses};
use crate::rules::record::{DeviceProperties, DeviceRecord};
use std::collections::BTreeMap;

/// All serial numbers used in the rules file, one entry per occurrence.
///
/// Both `ATTRS{serial}` and `ENV{ID_SERIAL}` count. Paired rules repeat their
/// serial on the remove line, so they contribute two entries.
pub fn list_serials(text: &str) -> Vec<&str> {
	collect_values(text, |field| field == Field::Serial)
}

/// All topology paths used in the rules file (`ATTRS{devpath}` and `ENV{ID_PATH}`),
/// one entry per occurrence.
pub fn list_paths(text: &str) -> Vec<&str> {
	collect_values(text, Field::is_topology)
}

/// All symlink names used in the rules file, one entry per occurrence.
pub fn list_names(text: &str) -> Vec<&str> {
	text.lines()
		.flat_map(scan_clauses)
		.filter_map(|clause| match clause {
			Clause::Symlink { name } => Some(name),
			Clause::Compare { .. } => None,
		})
		.collect()
}

fn collect_values(text: &str, wanted: impl Fn(Field) -> bool) -> Vec<&str> {
	text.lines()
		.flat_map(scan_clauses)
		.filter_map(|clause| match clause {
			Clause::Compare { field, value } if wanted(field) => Some(value),
			_ => None,
		})
		.collect()
}

/// Parse a single rule line into a record.
///
/// Returns `None` for lines without a symlink clause, which includes the
/// remove line of a paired rule. Each field takes the first matching clause on
/// the line; fields without a clause stay `None`.
pub fn parse_line(line: &str) -> Option<DeviceRecord> {
	let mut name = None;
	let mut props = DeviceProperties::default();

	for clause in scan_clauses(line) {
		match clause {
			Clause::Symlink { name: n } => {
				name.get_or_insert(n);
			}
			Clause::Compare { field, value } => {
				let slot = match field {
					Field::VendorId => &mut props.vendor_id,
					Field::ModelId => &mut props.model_id,
					Field::Serial => &mut props.serial,
					Field::Devpath => &mut props.devpath,
					Field::Path => &mut props.path,
				};
				slot.get_or_insert_with(|| value.to_string());
			}
		}
	}

	name.map(|name| DeviceRecord {
		name: name.to_string(),
		properties: props,
	})
}

/// Parse every named rule in a rules file.
///
/// Lines are parsed independently; a name appearing on several symlink lines
/// maps to the last of them. Malformed lines never fail, they just yield
/// partial records or nothing.
pub fn parse_device_records(text: &str) -> BTreeMap<String, DeviceRecord> {
	let mut records = BTreeMap::new();
	for record in text.lines().filter_map(parse_line) {
		records.insert(record.name.clone(), record);
	}
	records
}

#[cfg(test)]
pub(crate) mod tests {
	use super::*;

	pub(crate) const SAMPLE_RULES: &str = r#"
SUBSYSTEM=="tty", ATTRS{idVendor}=="1973",  ATTRS{idProduct}=="5927", ATTRS{devpath}=="1.1", SYMLINK+="Printer1"
SUBSYSTEM=="tty", ATTRS{idVendor}=="1973",  ATTRS{idProduct}=="5927", ATTRS{serial}=="3940855329", SYMLINK+="Printer2"
SUBSYSTEM=="tty", ATTRS{serial}=="ryvk87g4", SYMLINK+="Printer7"
SUBSYSTEM=="tty", ATTRS{devpath}=="1.5", SYMLINK+="Printer8"

SUBSYSTEM=="tty", ENV{ID_VENDOR_ID}=="m78", ENV{ID_MODEL_ID}=="ab4g", ENV{ID_SERIAL}=="kise", SYMLINK+="Printer3", ACTION=="add", RUN+="start"
SUBSYSTEM=="tty", ENV{ID_VENDOR_ID}=="m78", ENV{ID_MODEL_ID}=="ab4g", ENV{ID_SERIAL}=="kise", ACTION=="remove", RUN+="stop"
SUBSYSTEM=="tty", ENV{ID_SERIAL}=="kpl6", SYMLINK+="Printer4", ACTION=="add", RUN+="start"
SUBSYSTEM=="tty", ENV{ID_SERIAL}=="kpl6", ACTION=="remove", RUN+="stop"

SUBSYSTEM=="tty", ENV{ID_VENDOR_ID}=="m78", ENV{ID_MODEL_ID}=="ab4g", ENV{ID_PATH}=="UsbPathTo1", SYMLINK+="Printer5", ACTION=="add", RUN+="start"
SUBSYSTEM=="tty", ENV{ID_VENDOR_ID}=="m78", ENV{ID_MODEL_ID}=="ab4g", ENV{ID_PATH}=="UsbPathTo1", ACTION=="remove", RUN+="stop"
SUBSYSTEM=="tty", ENV{ID_PATH}=="UsbPathTo2", SYMLINK+="Printer6", ACTION=="add", RUN+="start"
SUBSYSTEM=="tty", ENV{ID_PATH}=="UsbPathTo2", ACTION=="remove", RUN+="stop"
"#;

	fn props(
		path: Option<&str>,
		vendor_id: Option<&str>,
		model_id: Option<&str>,
		serial: Option<&str>,
		devpath: Option<&str>,
	) -> DeviceProperties {
		DeviceProperties {
			path: path.map(str::to_string),
			vendor_id: vendor_id.map(str::to_string),
			model_id: model_id.map(str::to_string),
			serial: serial.map(str::to_string),
			devpath: devpath.map(str::to_string),
		}
	}

	#[test]
	fn test_list_serials_counts_paired_lines() {
		let serials = list_serials(SAMPLE_RULES);
		assert_eq!(
			serials,
			vec!["3940855329", "ryvk87g4", "kise", "kise", "kpl6", "kpl6"]
		);
	}

	#[test]
	fn test_list_paths() {
		let paths = list_paths(SAMPLE_RULES);
		assert_eq!(
			paths,
			vec![
				"1.1",
				"1.5",
				"UsbPathTo1",
				"UsbPathTo1",
				"UsbPathTo2",
				"UsbPathTo2"
			]
		);
	}

	#[test]
	fn test_list_names() {
		let names = list_names(SAMPLE_RULES);
		assert_eq!(names.len(), 8);
		for i in 1..=8 {
			assert!(names.contains(&format!("Printer{i}").as_str()));
		}
	}

	#[test]
	fn test_list_on_empty_text() {
		assert!(list_serials("").is_empty());
		assert!(list_paths("").is_empty());
		assert!(list_names("").is_empty());
		assert!(parse_device_records("").is_empty());
	}

	#[test]
	fn test_parse_device_records() {
		let records = parse_device_records(SAMPLE_RULES);
		assert_eq!(records.len(), 8);

		let expected = [
			("Printer1", props(None, Some("1973"), Some("5927"), None, Some("1.1"))),
			(
				"Printer2",
				props(None, Some("1973"), Some("5927"), Some("3940855329"), None),
			),
			("Printer3", props(None, Some("m78"), Some("ab4g"), Some("kise"), None)),
			("Printer4", props(None, None, None, Some("kpl6"), None)),
			(
				"Printer5",
				props(Some("UsbPathTo1"), Some("m78"), Some("ab4g"), None, None),
			),
			("Printer6", props(Some("UsbPathTo2"), None, None, None, None)),
			("Printer7", props(None, None, None, Some("ryvk87g4"), None)),
			("Printer8", props(None, None, None, None, Some("1.5"))),
		];

		for (name, expected_props) in expected {
			let record = records.get(name).unwrap();
			assert_eq!(record.name, name);
			assert_eq!(record.properties, expected_props, "record {name}");
		}
	}

	#[test]
	fn test_parse_line_without_symlink() {
		let line = r#"SUBSYSTEM=="tty", ENV{ID_SERIAL}=="kpl6", ACTION=="remove", RUN+="stop""#;
		assert!(parse_line(line).is_none());
	}

	#[test]
	fn test_parse_line_without_identifier() {
		let record = parse_line(r#"SUBSYSTEM=="tty", SYMLINK+="bare""#).unwrap();
		assert_eq!(record.name, "bare");
		assert_eq!(record.properties, DeviceProperties::default());
	}

	#[test]
	fn test_parse_last_duplicate_name_wins() {
		let text = "SUBSYSTEM==\"tty\", ATTRS{serial}==\"first\", SYMLINK+=\"dup\"\n\
		            SUBSYSTEM==\"tty\", ATTRS{serial}==\"second\", SYMLINK+=\"dup\"\n";
		let records = parse_device_records(text);
		assert_eq!(records.len(), 1);
		assert_eq!(records["dup"].properties.serial.as_deref(), Some("second"));
	}

	#[test]
	fn test_parse_garbage_degrades() {
		let text = "# comment\nnot a rule at all\nSYMLINK+=\"x\" ATTRS{serial}==\"broken\n";
		let records = parse_device_records(text);
		assert_eq!(records.len(), 1);
		assert_eq!(records["x"].properties.serial, None);
	}
}
