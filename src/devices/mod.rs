//! Attached device enumeration for octodocker.
//!
//! This module handles:
//! - Listing tty devices through libudev
//! - Extracting their USB path, ids, serial and devpath

pub mod scanner;

pub use scanner::{DeviceNode, device_properties, list_devices};
