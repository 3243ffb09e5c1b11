use crate::error::{OctoError, Result};
use crate::rules::record::DeviceProperties;

/// Read access to a device in the udev hierarchy.
pub trait DeviceNode: Sized {
	/// A udev property such as `ID_PATH`.
	fn property(&self, key: &str) -> Option<String>;

	/// A sysfs attribute such as `devpath`.
	fn attribute(&self, name: &str) -> Option<String>;

	fn parent(&self) -> Option<Self>;
}

impl DeviceNode for udev::Device {
	fn property(&self, key: &str) -> Option<String> {
		self.property_value(key)
			.and_then(|value| value.to_str())
			.map(str::to_string)
	}

	fn attribute(&self, name: &str) -> Option<String> {
		self.attribute_value(name)
			.and_then(|value| value.to_str())
			.map(|value| value.trim().to_string())
	}

	fn parent(&self) -> Option<Self> {
		udev::Device::parent(self)
	}
}

/// Walks from a device up through its parents.
struct Hierarchy<D>(Option<D>);

impl<D: DeviceNode> Iterator for Hierarchy<D> {
	type Item = D;

	fn next(&mut self) -> Option<Self::Item> {
		let device = self.0.take()?;
		self.0 = device.parent();
		Some(device)
	}
}

/// List every tty device that udev has assigned a USB path (`ID_PATH`).
///
/// Devices without a path are not attached through USB and are skipped.
pub fn list_devices() -> Result<Vec<DeviceProperties>> {
	let to_error = |source| OctoError::DeviceScan { source };

	let mut enumerator = udev::Enumerator::new().map_err(to_error)?;
	enumerator.match_subsystem("tty").map_err(to_error)?;

	let devices: Vec<_> = enumerator
		.scan_devices()
		.map_err(to_error)?
		.filter_map(|device| {
			let properties = device_properties(&device);
			if properties.is_none() {
				tracing::trace!(syspath = %device.syspath().display(), "skipping tty without ID_PATH");
			}
			properties
		})
		.collect();

	tracing::debug!(count = devices.len(), "scanned serial devices");
	Ok(devices)
}

/// Extract the identifying properties of one tty device.
///
/// Returns `None` when the device has no non-empty `ID_PATH`. The `devpath`
/// comes from the device itself or the closest parent that has one.
pub fn device_properties<D: DeviceNode>(device: &D) -> Option<DeviceProperties> {
	let path = device.property("ID_PATH").filter(|p| !p.is_empty())?;

	let devpath = device
		.attribute("devpath")
		.filter(|d| !d.is_empty())
		.or_else(|| {
			Hierarchy(device.parent())
				.find_map(|parent| parent.attribute("devpath").filter(|d| !d.is_empty()))
		});

	Some(DeviceProperties {
		path: Some(path),
		vendor_id: device.property("ID_VENDOR_ID"),
		model_id: device.property("ID_MODEL_ID"),
		serial: device.property("ID_SERIAL"),
		devpath,
	})
}
