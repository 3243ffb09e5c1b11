//! Octodocker - manage udev rules that give USB serial printers stable names.
//!
//! This library provides the core functionality for octodocker, including:
//! - Building, parsing and editing udev rules files
//! - Listing attached USB serial devices
//! - Generating OctoPrint compose files started and stopped by udev
//! - Configuration file discovery
//!
//! # Example
//!
//! ```no_run
//! use octodocker::manager::{AddRequest, RulesFile};
//! use octodocker::rules::DeviceProperties;
//!
//! let file = RulesFile::new("/etc/udev/rules.d/99-serial.rules");
//! let request = AddRequest {
//!     name: "Printer1".to_string(),
//!     properties: DeviceProperties {
//!         serial: Some("CZPX1234".to_string()),
//!         ..Default::default()
//!     },
//! };
//! file.add_rule(&request, false).unwrap();
//!
//! for (name, record) in file.records().unwrap() {
//!     println!("{name}: {:?}", record.properties);
//! }
//! ```

pub mod compose;
pub mod config;
pub mod devices;
pub mod error;
pub mod manager;
pub mod rules;

pub use error::{OctoError, Result};
