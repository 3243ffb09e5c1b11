use crate::error::{OctoError, Result};
use crate::rules::clause::{
	CLAUSE_SEPARATOR, SUBSYSTEM_CLAUSE, action_clause, attribute_clause, env_clause, run_clause,
	symlink_clause, validate_value,
};
use crate::rules::record::DeviceProperties;

/// Build a plain symlink rule for a serial device.
///
/// At least one of serial, devpath or path must be set. When several are set,
/// only one identifying clause is emitted, preferring serial > devpath > path.
/// Serial and devpath are matched as attributes, path as environment.
pub fn build_rule(name: &str, props: &DeviceProperties) -> Result<String> {
	validate_all(name, props)?;

	let identifier = if let Some(ref serial) = props.serial {
		attribute_clause("serial", serial)
	} else if let Some(ref devpath) = props.devpath {
		attribute_clause("devpath", devpath)
	} else if let Some(ref path) = props.path {
		env_clause("ID_PATH", path)
	} else {
		return Err(OctoError::MissingIdentifier {
			expected: "serial, devpath or path",
		});
	};

	let mut clauses = vec![SUBSYSTEM_CLAUSE.to_string()];
	if let Some(ref vendor_id) = props.vendor_id {
		clauses.push(attribute_clause("idVendor", vendor_id));
	}
	if let Some(ref model_id) = props.model_id {
		clauses.push(attribute_clause("idProduct", model_id));
	}
	clauses.push(identifier);
	clauses.push(symlink_clause(name));

	Ok(clauses.join(CLAUSE_SEPARATOR))
}

/// Build a connect/disconnect rule pair for a serial device.
///
/// Produces two lines sharing the identifying clauses: the first creates the
/// symlink and runs `start_command` on `add`, the second runs `stop_command`
/// on `remove`. Only serial and path identify the device here (serial > path),
/// and every comparison uses the environment style.
pub fn build_start_stop_rule(
	name: &str,
	start_command: &str,
	stop_command: &str,
	props: &DeviceProperties,
) -> Result<String> {
	validate_all(name, props)?;
	validate_value("start command", start_command)?;
	validate_value("stop command", stop_command)?;

	let identifier = if let Some(ref serial) = props.serial {
		env_clause("ID_SERIAL", serial)
	} else if let Some(ref path) = props.path {
		env_clause("ID_PATH", path)
	} else {
		return Err(OctoError::MissingIdentifier {
			expected: "serial or path",
		});
	};

	let mut shared = vec![SUBSYSTEM_CLAUSE.to_string()];
	if let Some(ref vendor_id) = props.vendor_id {
		shared.push(env_clause("ID_VENDOR_ID", vendor_id));
	}
	if let Some(ref model_id) = props.model_id {
		shared.push(env_clause("ID_MODEL_ID", model_id));
	}
	shared.push(identifier);

	let mut add_line = shared.clone();
	add_line.push(symlink_clause(name));
	add_line.push(action_clause("add"));
	add_line.push(run_clause(start_command));

	let mut remove_line = shared;
	remove_line.push(action_clause("remove"));
	remove_line.push(run_clause(stop_command));

	Ok(format!(
		"{}\n{}",
		add_line.join(CLAUSE_SEPARATOR),
		remove_line.join(CLAUSE_SEPARATOR)
	))
}

fn validate_all(name: &str, props: &DeviceProperties) -> Result<()> {
	validate_value("name", name)?;
	let fields = [
		("serial", &props.serial),
		("devpath", &props.devpath),
		("path", &props.path),
		("vendor id", &props.vendor_id),
		("model id", &props.model_id),
	];
	for (field, value) in fields {
		if let Some(value) = value {
			validate_value(field, value)?;
		}
	}
	Ok(())
}
