use crate::error::{OctoError, Result};
use regex::Regex;
use std::sync::LazyLock;

/// Subsystem match every rule starts with.
pub const SUBSYSTEM_CLAUSE: &str = r#"SUBSYSTEM=="tty""#;

/// Separator between clauses of a rule line.
pub const CLAUSE_SEPARATOR: &str = ", ";

/// Matches `ATTRS{key}=="value"`, `ENV{key}=="value"` and `SYMLINK+="name"`.
static CLAUSE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r#"(ATTRS|ENV)\{([^}"\n]*)\}=="([^"\n]*)"|SYMLINK\+="([^"\n]*)""#)
		.expect("clause pattern is valid")
});

/// Build an attribute comparison: `ATTRS{field}=="value"`.
pub fn attribute_clause(field: &str, value: &str) -> String {
	format!(r#"ATTRS{{{field}}}=="{value}""#)
}

/// Build an environment comparison: `ENV{field}=="value"`.
pub fn env_clause(field: &str, value: &str) -> String {
	format!(r#"ENV{{{field}}}=="{value}""#)
}

/// Build a symlink assignment: `SYMLINK+="name"`.
pub fn symlink_clause(name: &str) -> String {
	format!(r#"SYMLINK+="{name}""#)
}

/// Build an action match: `ACTION=="action"`.
pub fn action_clause(action: &str) -> String {
	format!(r#"ACTION=="{action}""#)
}

/// Build a run assignment: `RUN+="command"`.
pub fn run_clause(command: &str) -> String {
	format!(r#"RUN+="{command}""#)
}

/// Reject values that would corrupt a rule line.
///
/// Clause values are written unescaped, so a `"` or a line break would end
/// the clause or the rule early.
pub fn validate_value(field: &'static str, value: &str) -> Result<()> {
	if value.contains(['"', '\n', '\r']) {
		return Err(OctoError::InvalidValue {
			field,
			value: value.to_string(),
		});
	}
	Ok(())
}

/// Logical device field a comparison clause refers to.
///
/// Attribute and environment spellings of the same property collapse to one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
	VendorId,
	ModelId,
	Serial,
	Devpath,
	Path,
}

impl Field {
	/// Map a clause key (`ATTRS` or `ENV`) and field name to a logical field.
	fn from_key(key: &str, name: &str) -> Option<Self> {
		match (key, name) {
			("ATTRS", "idVendor") | ("ENV", "ID_VENDOR_ID") => Some(Field::VendorId),
			("ATTRS", "idProduct") | ("ENV", "ID_MODEL_ID") => Some(Field::ModelId),
			("ATTRS", "serial") | ("ENV", "ID_SERIAL") => Some(Field::Serial),
			("ATTRS", "devpath") => Some(Field::Devpath),
			("ENV", "ID_PATH") => Some(Field::Path),
			_ => None,
		}
	}

	/// Whether this field encodes USB topology (`devpath` or `ID_PATH`).
	pub fn is_topology(self) -> bool {
		matches!(self, Field::Devpath | Field::Path)
	}
}

/// A recognised clause found on a rule line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clause<'a> {
	/// A comparison against a known device field.
	Compare { field: Field, value: &'a str },

	/// A symlink assignment.
	Symlink { name: &'a str },
}

/// Scan one rule line for recognised clauses, in the order they appear.
///
/// Unknown comparisons (`KERNEL`, `ATTRS{manufacturer}`, ...) are skipped.
pub fn scan_clauses(line: &str) -> impl Iterator<Item = Clause<'_>> {
	CLAUSE_REGEX.captures_iter(line).filter_map(|caps| {
		if let Some(name) = caps.get(4) {
			return Some(Clause::Symlink {
				name: name.as_str(),
			});
		}

		let key = caps.get(1)?.as_str();
		let field_name = caps.get(2)?.as_str();
		let value = caps.get(3)?.as_str();
		Field::from_key(key, field_name).map(|field| Clause::Compare { field, value })
	})
}
