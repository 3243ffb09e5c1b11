//! udev rule text handling for octodocker.
//!
//! This module handles:
//! - Building rule clauses and complete rules (plain and connect/disconnect pairs)
//! - Parsing a rules file into device records and identifier listings
//! - Appending rules and removing them by serial, path or symlink name

pub mod builder;
pub mod clause;
pub mod editor;
pub mod parser;
pub mod record;

pub use builder::{build_rule, build_start_stop_rule};
pub use clause::{Field, attribute_clause, env_clause};
pub use editor::{
	IdentifierIndex, IdentifierKind, append_rule, remove_by_name, remove_by_path, remove_by_serial,
	remove_lines_matching,
};
pub use parser::{list_names, list_paths, list_serials, parse_device_records, parse_line};
pub use record::{DeviceProperties, DeviceRecord};
