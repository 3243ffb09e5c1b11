use crate::rules::clause::{Clause, Field, scan_clauses};
use std::collections::{BTreeSet, HashMap};

/// Append a rule to the rules file text.
///
/// This is not plain concatenation. A newline is inserted first when `text`
/// is non-empty and does not end with one, and any trailing line breaks of
/// `rule` are collapsed into exactly one `\n`. No duplicate detection happens
/// here.
pub fn append_rule(text: &str, rule: &str) -> String {
	let rule = rule.trim_end_matches(['\n', '\r']);
	let mut result = String::with_capacity(text.len() + rule.len() + 2);
	result.push_str(text);
	if !text.is_empty() && !text.ends_with('\n') {
		result.push('\n');
	}
	result.push_str(rule);
	result.push('\n');
	result
}

/// Remove every line containing `clause` as a substring, including its newline.
///
/// Other lines are kept verbatim and in order.
pub fn remove_lines_matching(text: &str, clause: &str) -> String {
	text.split_inclusive('\n')
		.filter(|line| !line.contains(clause))
		.collect()
}

/// Remove every line that compares against the given serial number
/// (`ATTRS{serial}` or `ENV{ID_SERIAL}`).
///
/// For a paired rule both the add and the remove line carry the serial, so
/// both are removed.
pub fn remove_by_serial(text: &str, serial: &str) -> String {
	let index = IdentifierIndex::build(text);
	index.without(index.lines_for(IdentifierKind::Serial, serial))
}

/// Remove every line that compares against the given topology path
/// (`ATTRS{devpath}` or `ENV{ID_PATH}`).
pub fn remove_by_path(text: &str, path: &str) -> String {
	let index = IdentifierIndex::build(text);
	index.without(index.lines_for(IdentifierKind::Topology, path))
}

/// Remove every line belonging to the rule with the given symlink name.
///
/// The remove line of a paired rule has no symlink clause, so the name is first
/// resolved to the identifier found next to it, topology paths before serials,
/// and all lines carrying that identifier are removed. A name without an
/// identifier on its line leaves the text unchanged.
pub fn remove_by_name(text: &str, name: &str) -> String {
	let index = IdentifierIndex::build(text);
	match index.identifier_for_name(name) {
		Some((kind, value)) => index.without(index.lines_for(kind, value)),
		None => text.to_string(),
	}
}

/// Kind of value that identifies a logical rule across its lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentifierKind {
	/// `ATTRS{serial}` or `ENV{ID_SERIAL}`.
	Serial,

	/// `ATTRS{devpath}` or `ENV{ID_PATH}`.
	Topology,
}

impl IdentifierKind {
	fn of(field: Field) -> Option<Self> {
		match field {
			Field::Serial => Some(IdentifierKind::Serial),
			Field::Devpath | Field::Path => Some(IdentifierKind::Topology),
			Field::VendorId | Field::ModelId => None,
		}
	}
}

/// Line index of a rules file, keyed by identifying value.
///
/// Built in one pass over the text; removals then drop lines by number instead
/// of re-matching the text.
#[derive(Debug)]
pub struct IdentifierIndex<'a> {
	/// Physical lines including their line terminators.
	lines: Vec<&'a str>,

	/// Identifiers present on each line, in clause order.
	identifiers: Vec<Vec<(IdentifierKind, &'a str)>>,

	/// Line numbers carrying each identifier.
	by_identifier: HashMap<(IdentifierKind, &'a str), BTreeSet<usize>>,

	/// Line numbers carrying each symlink name, in file order.
	by_name: HashMap<&'a str, Vec<usize>>,
}

impl<'a> IdentifierIndex<'a> {
	/// Index every line of `text`.
	pub fn build(text: &'a str) -> Self {
		let lines: Vec<&str> = text.split_inclusive('\n').collect();
		let mut identifiers = Vec::with_capacity(lines.len());
		let mut by_identifier: HashMap<_, BTreeSet<usize>> = HashMap::new();
		let mut by_name: HashMap<_, Vec<usize>> = HashMap::new();

		for (number, &line) in lines.iter().enumerate() {
			let mut on_line = Vec::new();
			for clause in scan_clauses(line) {
				match clause {
					Clause::Symlink { name } => by_name.entry(name).or_default().push(number),
					Clause::Compare { field, value } => {
						if let Some(kind) = IdentifierKind::of(field) {
							on_line.push((kind, value));
							by_identifier
								.entry((kind, value))
								.or_default()
								.insert(number);
						}
					}
				}
			}
			identifiers.push(on_line);
		}

		IdentifierIndex {
			lines,
			identifiers,
			by_identifier,
			by_name,
		}
	}

	/// Line numbers carrying the given identifier.
	pub fn lines_for(&self, kind: IdentifierKind, value: &str) -> BTreeSet<usize> {
		self.by_identifier
			.get(&(kind, value))
			.cloned()
			.unwrap_or_default()
	}

	/// Resolve a symlink name to the identifier sharing its line.
	///
	/// Topology paths take precedence over serials; within a kind, the first
	/// line carrying the name wins.
	pub fn identifier_for_name(&self, name: &str) -> Option<(IdentifierKind, &'a str)> {
		let lines = self.by_name.get(name)?;
		[IdentifierKind::Topology, IdentifierKind::Serial]
			.into_iter()
			.find_map(|wanted| {
				lines.iter().find_map(|&number| {
					self.identifiers[number]
						.iter()
						.find(|(kind, _)| *kind == wanted)
						.copied()
				})
			})
	}

	/// Reassemble the text without the given lines.
	pub fn without(&self, removed: BTreeSet<usize>) -> String {
		self.lines
			.iter()
			.enumerate()
			.filter(|(number, _)| !removed.contains(number))
			.map(|(_, line)| *line)
			.collect()
	}
}
