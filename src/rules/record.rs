/// Identifying properties of a USB serial device.
///
/// Shared by parsed rules and by attached devices reported by the scanner.
/// Absent fields are `None`, never empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceProperties {
	/// USB topology path (`ID_PATH`, environment style).
	pub path: Option<String>,

	/// USB vendor id (`idVendor` / `ID_VENDOR_ID`).
	pub vendor_id: Option<String>,

	/// USB product id (`idProduct` / `ID_MODEL_ID`).
	pub model_id: Option<String>,

	/// Serial number (`serial` / `ID_SERIAL`).
	pub serial: Option<String>,

	/// USB topology path (`devpath`, attribute style).
	pub devpath: Option<String>,
}

/// One logical rule entry of a rules file, keyed by its symlink name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRecord {
	/// The symlink name created by the rule.
	pub name: String,

	/// Properties matched by the rule line carrying the symlink.
	pub properties: DeviceProperties,
}

impl DeviceProperties {
	/// Iterate over the present properties as `(label, value)` pairs in display order.
	pub fn labeled(&self) -> impl Iterator<Item = (&'static str, &str)> {
		[
			("Serial", self.serial.as_deref()),
			("Vendor ID", self.vendor_id.as_deref()),
			("Model ID/Product ID", self.model_id.as_deref()),
			("Path ID", self.path.as_deref()),
			("Devpath", self.devpath.as_deref()),
		]
		.into_iter()
		.filter_map(|(label, value)| value.map(|v| (label, v)))
	}
}
