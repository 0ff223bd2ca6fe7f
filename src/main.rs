use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use envflow::exec::{execute_command, resolve_command};
use envflow::loader::{Options, config, load_options, resolve_files};
use envflow::store::{MemoryEnv, ProcessEnv};

#[derive(Parser)]
#[command(name = "envflow")]
#[command(
	author,
	version,
	about = "Load cascading .env files with interpolation and value coercion"
)]
#[command(propagate_version = true)]
struct Cli {
	#[command(subcommand)]
	command: Commands,

	#[command(flatten)]
	options: OptionArgs,
}

/// Loading options; these override values from `.envflow.toml`.
#[derive(Args)]
struct OptionArgs {
	/// Environment name (falls back to NODE_ENV)
	#[arg(long, global = true, value_name = "ENV")]
	node_env: Option<String>,

	/// Environment name used when neither --node-env nor NODE_ENV is set
	#[arg(long, global = true, value_name = "ENV")]
	default_node_env: Option<String>,

	/// Directory containing the env files
	#[arg(long, global = true, env = "ENVFLOW_PATH")]
	path: Option<PathBuf>,

	/// Env file naming pattern
	#[arg(long, global = true, env = "ENVFLOW_PATTERN")]
	pattern: Option<String>,

	/// Explicit env file to load (repeatable; disables pattern lookup)
	#[arg(long = "file", global = true, value_name = "FILE")]
	files: Vec<String>,

	/// Encoding of the env files
	#[arg(long, global = true)]
	encoding: Option<String>,

	/// Unload a previously loaded .env before loading
	#[arg(long, global = true)]
	purge_dotenv: bool,

	/// Enable debug logging
	#[arg(long, global = true)]
	debug: bool,

	/// Suppress loading warnings
	#[arg(long, global = true)]
	silent: bool,
}

impl OptionArgs {
	fn into_options(self) -> Options {
		Options {
			node_env: self.node_env,
			default_node_env: self.default_node_env,
			path: self.path,
			pattern: self.pattern,
			files: (!self.files.is_empty()).then_some(self.files),
			encoding: self.encoding,
			purge_dotenv: self.purge_dotenv,
			debug: self.debug,
			silent: self.silent,
		}
	}
}

#[derive(Subcommand)]
enum Commands {
	/// List the env files that would be loaded, in cascade order
	Files,
	/// Load the env files and print the resulting variables
	Print {
		/// Print a JSON object of typed values
		#[arg(long)]
		json: bool,
	},
	/// Load the env files and run a command with them
	Run {
		/// Command to run
		#[arg(
			trailing_var_arg = true,
			allow_hyphen_values = true,
			required = true,
			value_name = "COMMAND"
		)]
		command: Vec<String>,
	},
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

	let cwd = std::env::current_dir().context("Failed to get current directory")?;
	let file_options = load_options(&cwd).context("Failed to load options file")?;
	let options = file_options.merge(cli.options.into_options());

	init_tracing(options.debug);

	match cli.command {
		Commands::Files => handle_files(&options),
		Commands::Print { json } => handle_print(&options, json),
		Commands::Run { command } => handle_run(&options, &command),
	}
}

fn init_tracing(debug: bool) {
	// RUST_LOG in the environment takes precedence over --debug
	let default_level = if debug { "debug" } else { "warn" };
	let filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

	let _ = tracing_subscriber::registry()
		.with(
			fmt::layer()
				.with_writer(std::io::stderr)
				.with_ansi(std::io::stderr().is_terminal()),
		)
		.with(filter)
		.try_init();
}

fn handle_files(options: &Options) -> Result<ExitCode> {
	let files = resolve_files(options, &ProcessEnv).context("Failed to list env files")?;

	for file in &files {
		println!("{}", file.display());
	}

	Ok(ExitCode::SUCCESS)
}

fn handle_print(options: &Options, json: bool) -> Result<ExitCode> {
	let mut store = MemoryEnv::from_process();

	// `config` has already reported the failure
	let Ok(resolved) = config(options, &mut store) else {
		return Ok(ExitCode::FAILURE);
	};

	if json {
		let rendered =
			serde_json::to_string_pretty(&resolved).context("Failed to render variables")?;
		println!("{}", rendered);
	} else {
		for (key, value) in &resolved {
			println!("{}={}", key, value);
		}
	}

	Ok(ExitCode::SUCCESS)
}

fn handle_run(options: &Options, command: &[String]) -> Result<ExitCode> {
	let (name, args) = command.split_first().context("No command given")?;

	// `config` has already warned; the command still runs with the current environment
	if let Err(error) = config(options, &mut ProcessEnv) {
		debug!("running `{}` without loaded env files: {}", name, error);
	}

	let binary = resolve_command(name)
		.ok_or_else(|| anyhow::anyhow!("Command not found: {}", name))?;

	let status = execute_command(&binary, args)
		.with_context(|| format!("Failed to execute: {}", binary.display()))?;

	let exit_code = status.code().unwrap_or(1);
	Ok(ExitCode::from(exit_code as u8))
}
