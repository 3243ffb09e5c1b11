use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use octodocker::compose::compose_file_path;
use octodocker::config::{LoadedConfig, discover_config, user_config_path};
use octodocker::devices::list_devices;
use octodocker::manager::{AddRequest, RemoveTarget, RulesFile};
use octodocker::rules::DeviceProperties;

#[derive(Parser)]
#[command(name = "octodocker")]
#[command(
	author,
	version,
	about = "Manage udev rules that give USB serial printers stable names, optionally starting an OctoPrint container"
)]
#[command(arg_required_else_help = true)]
struct Cli {
	#[command(subcommand)]
	command: Commands,

	/// Filepath of the udev rule file to use
	#[arg(short = 'f', long = "file", value_name = "FILEPATH", global = true)]
	file: Option<PathBuf>,

	/// Config file to use instead of the default lookup
	#[arg(long, value_name = "FILEPATH", global = true)]
	config: Option<PathBuf>,

	/// Log what is read and written
	#[arg(long, global = true)]
	verbose: bool,

	/// Log output format
	#[arg(long, value_enum, default_value = "pretty", global = true)]
	log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, ValueEnum)]
enum LogFormat {
	Pretty,
	Json,
}

#[derive(Subcommand)]
enum Commands {
	/// Shows a list of all connected devices and their relevant data
	Devices,
	/// Shows a list of all udev rules and their data
	Rules,
	/// Add a udev rule
	Add {
		/// Name to use for the device
		#[arg(value_name = "DEVICE_NAME")]
		name: String,

		#[command(flatten)]
		options: AddOptions,

		#[command(subcommand)]
		identifier: AddIdentifier,
	},
	/// Remove a udev rule
	Remove {
		#[command(subcommand)]
		target: RemoveCommand,
	},
	/// Configuration commands
	Config {
		#[command(subcommand)]
		action: ConfigAction,
	},
}

#[derive(Args)]
struct AddOptions {
	/// Includes the specified vendor id in the rule
	#[arg(short = 'v', long = "vendor", value_name = "VENDOR_ID", global = true)]
	vendor: Option<String>,

	/// Includes the specified model id (product id) in the rule
	#[arg(short = 'm', long = "model", value_name = "MODEL_ID", global = true)]
	model: Option<String>,

	/// Creates a docker compose file providing OctoPrint on this port, started and stopped by the rule
	#[arg(short = 'd', long = "docker", value_name = "PORT", global = true)]
	docker: Option<u16>,

	/// Where to write the docker compose file
	#[arg(long, value_name = "FILEPATH", requires = "docker", global = true)]
	compose_file: Option<PathBuf>,

	/// Add the rule even if the name, path or serial number is already in use
	#[arg(long, global = true)]
	force: bool,
}

#[derive(Subcommand)]
enum AddIdentifier {
	/// Identify a device through its serial number
	Serial {
		/// Serial number of the device
		serial: String,
	},
	/// Identify a device through the USB port (ID_PATH) it is connected to
	Path {
		/// Path id of the USB device
		path: String,
	},
	/// Identify a device through the USB port (devpath) it is connected to; no docker support
	Devpath {
		/// Devpath of the USB device
		devpath: String,
	},
}

#[derive(Subcommand)]
enum RemoveCommand {
	/// Remove udev rules associated with a serial number
	Serial {
		/// Serial number used in the rule
		serial: String,
	},
	/// Remove udev rules associated with a path id or devpath
	Path {
		/// Path id or devpath used in the rule
		path: String,
	},
	/// Remove udev rules associated with a name
	Name {
		/// Name used in the rule
		name: String,
	},
}

#[derive(Subcommand)]
enum ConfigAction {
	/// Display the effective configuration and where it came from
	Show,
	/// Print the path of the user config file
	Path,
}

fn main() -> ExitCode {
	match run() {
		Ok(code) => code,
		Err(e) => {
			eprintln!("error: {e:?}");
			ExitCode::FAILURE
		}
	}
}

fn run() -> Result<ExitCode> {
	let cli = Cli::parse();
	init_logging(cli.verbose, cli.log_format);

	let loaded = discover_config(cli.config.as_deref()).context("Failed to load configuration")?;
	let rules_path = cli
		.file
		.clone()
		.unwrap_or_else(|| loaded.config.rules_file());

	match cli.command {
		Commands::Devices => handle_devices(),
		Commands::Rules => handle_rules(&rules_path),
		Commands::Add {
			name,
			options,
			identifier,
		} => handle_add(&loaded, &rules_path, name, options, identifier),
		Commands::Remove { target } => handle_remove(&rules_path, target),
		Commands::Config { action } => match action {
			ConfigAction::Show => handle_config_show(&loaded, &rules_path),
			ConfigAction::Path => handle_config_path(),
		},
	}
}

fn init_logging(verbose: bool, format: LogFormat) {
	let default_level = if verbose {
		LevelFilter::DEBUG
	} else {
		LevelFilter::WARN
	};
	let filter = EnvFilter::builder()
		.with_default_directive(default_level.into())
		.from_env_lossy();

	match format {
		LogFormat::Pretty => {
			tracing_subscriber::fmt()
				.with_env_filter(filter)
				.with_writer(std::io::stderr)
				.init();
		}
		LogFormat::Json => {
			tracing_subscriber::fmt()
				.json()
				.with_env_filter(filter)
				.with_writer(std::io::stderr)
				.with_current_span(false)
				.with_span_list(false)
				.init();
		}
	}
}

fn print_properties(properties: &DeviceProperties) {
	for (label, value) in properties.labeled() {
		println!("{label}: {value}");
	}
}

fn handle_devices() -> Result<ExitCode> {
	let devices = list_devices().context("Failed to list devices")?;

	if devices.is_empty() {
		println!("No USB serial devices found.");
		return Ok(ExitCode::SUCCESS);
	}

	for device in &devices {
		println!("Device:");
		print_properties(device);
		println!();
	}
	Ok(ExitCode::SUCCESS)
}

fn handle_rules(rules_path: &Path) -> Result<ExitCode> {
	let records = RulesFile::new(rules_path)
		.records()
		.with_context(|| format!("Failed to read rules from {}", rules_path.display()))?;

	if records.is_empty() {
		println!("No rules found in {}.", rules_path.display());
		return Ok(ExitCode::SUCCESS);
	}

	for (name, record) in &records {
		println!("{name}:");
		print_properties(&record.properties);
		println!();
	}
	Ok(ExitCode::SUCCESS)
}

fn handle_add(
	loaded: &LoadedConfig,
	rules_path: &Path,
	name: String,
	options: AddOptions,
	identifier: AddIdentifier,
) -> Result<ExitCode> {
	let mut properties = DeviceProperties {
		vendor_id: options.vendor,
		model_id: options.model,
		..Default::default()
	};
	match identifier {
		AddIdentifier::Serial { serial } => properties.serial = Some(serial),
		AddIdentifier::Path { path } => properties.path = Some(path),
		AddIdentifier::Devpath { devpath } => properties.devpath = Some(devpath),
	}

	let request = AddRequest { name, properties };
	let file = RulesFile::new(rules_path);

	match options.docker {
		Some(port) => {
			let compose_file = match options.compose_file {
				Some(path) => path,
				None => {
					let compose_dir = loaded
						.config
						.compose_dir()
						.context("Failed to resolve compose directory")?;
					compose_file_path(&request.name, None, &compose_dir)
				}
			};
			let compose_file = file
				.add_compose_rule(&request, port, &compose_file, options.force)
				.with_context(|| format!("Failed to add rule for {}", request.name))?;
			println!(
				"Added rule for {} to {}",
				request.name,
				rules_path.display()
			);
			println!("Created compose file {}", compose_file.display());
		}
		None => {
			file.add_rule(&request, options.force)
				.with_context(|| format!("Failed to add rule for {}", request.name))?;
			println!(
				"Added rule for {} to {}",
				request.name,
				rules_path.display()
			);
		}
	}
	Ok(ExitCode::SUCCESS)
}

fn handle_remove(rules_path: &Path, command: RemoveCommand) -> Result<ExitCode> {
	let target = match command {
		RemoveCommand::Serial { serial } => RemoveTarget::Serial(serial),
		RemoveCommand::Path { path } => RemoveTarget::Path(path),
		RemoveCommand::Name { name } => RemoveTarget::Name(name),
	};

	let removed = RulesFile::new(rules_path)
		.remove_rule(&target)
		.with_context(|| format!("Failed to remove rule from {}", rules_path.display()))?;

	if removed == 0 {
		println!("No matching rule found in {}.", rules_path.display());
	} else {
		println!(
			"Removed {} line(s) from {}",
			removed,
			rules_path.display()
		);
	}
	Ok(ExitCode::SUCCESS)
}

fn handle_config_show(loaded: &LoadedConfig, rules_path: &Path) -> Result<ExitCode> {
	match loaded.path {
		Some(ref path) => println!("# Source: {}", path.display()),
		None => println!("# Source: built-in defaults"),
	}

	println!("rules-file: {}", rules_path.display());
	match loaded.config.compose_dir() {
		Ok(dir) => println!("compose-dir: {}", dir.display()),
		Err(e) => println!("compose-dir: <unresolved: {e}>"),
	}

	Ok(ExitCode::SUCCESS)
}

fn handle_config_path() -> Result<ExitCode> {
	let path = user_config_path().context("Failed to resolve user config path")?;
	println!("{}", path.display());
	if path.exists() {
		println!("  (exists)");
	} else {
		println!("  (not found)");
	}
	Ok(ExitCode::SUCCESS)
}
