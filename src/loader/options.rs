use crate::error::{EnvflowError, Result};
use crate::pattern::DEFAULT_PATTERN;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Name of the options file looked up in the working and home directories.
pub const OPTIONS_FILENAME: &str = ".envflow.toml";

/// Options controlling which env files are loaded and how.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct Options {
	/// Environment name (development/test/production/...).
	/// Falls back to `NODE_ENV`, then to `default_node_env`.
	#[serde(default)]
	pub node_env: Option<String>,

	/// Environment name used when neither `node_env` nor `NODE_ENV` is set.
	#[serde(default)]
	pub default_node_env: Option<String>,

	/// Directory the env files live in. Defaults to the working directory.
	#[serde(default)]
	pub path: Option<PathBuf>,

	/// Naming pattern, `.env[.node_env][.local]` by default.
	#[serde(default)]
	pub pattern: Option<String>,

	/// Explicit list of files to load, in order.
	/// When set, `node_env`, `default_node_env` and `pattern` are ignored.
	#[serde(default)]
	pub files: Option<Vec<String>>,

	/// Encoding label of the env files, UTF-8 by default.
	#[serde(default)]
	pub encoding: Option<String>,

	/// Unload a previously loaded `.env` before loading the cascade.
	#[serde(default)]
	pub purge_dotenv: bool,

	/// Emit debug logging (honored by the binary's log filter).
	#[serde(default)]
	pub debug: bool,

	/// Suppress warnings about loading failures.
	#[serde(default)]
	pub silent: bool,
}

impl Options {
	/// Directory the env files are resolved against.
	pub fn base_path(&self) -> PathBuf {
		match &self.path {
			Some(path) => path.clone(),
			None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
		}
	}

	pub fn pattern(&self) -> &str {
		self.pattern.as_deref().unwrap_or(DEFAULT_PATTERN)
	}

	/// Overlay `other` on top of `self`; values set in `other` win.
	pub fn merge(self, other: Options) -> Options {
		Options {
			node_env: other.node_env.or(self.node_env),
			default_node_env: other.default_node_env.or(self.default_node_env),
			path: other.path.or(self.path),
			pattern: other.pattern.or(self.pattern),
			files: other.files.or(self.files),
			encoding: other.encoding.or(self.encoding),
			purge_dotenv: self.purge_dotenv || other.purge_dotenv,
			debug: self.debug || other.debug,
			silent: self.silent || other.silent,
		}
	}
}

/// Parse an options file from the given path.
pub fn parse_options_file(path: &Path) -> Result<Options> {
	let content = std::fs::read_to_string(path).map_err(|source| EnvflowError::OptionsRead {
		path: path.to_path_buf(),
		source,
	})?;

	parse_options_str(&content, path)
}

/// Parse options from a string (useful for testing).
pub fn parse_options_str(content: &str, path: &Path) -> Result<Options> {
	toml::from_str(content).map_err(|source| EnvflowError::OptionsParse {
		path: path.to_path_buf(),
		source,
	})
}

/// Find the options file for `start_dir`.
///
/// `start_dir/.envflow.toml` wins over `~/.envflow.toml`.
pub fn discover_options_file(start_dir: &Path) -> Result<Option<PathBuf>> {
	let local = start_dir.join(OPTIONS_FILENAME);
	if local.exists() {
		return Ok(Some(local));
	}

	// No home directory simply means no user options file
	let Ok(user) = user_options_path() else {
		return Ok(None);
	};
	Ok(user.exists().then_some(user))
}

/// Load the options file for `start_dir`, or defaults when there is none.
pub fn load_options(start_dir: &Path) -> Result<Options> {
	match discover_options_file(start_dir)? {
		Some(path) => parse_options_file(&path),
		None => Ok(Options::default()),
	}
}

/// Get the path to the user's options file.
pub fn user_options_path() -> Result<PathBuf> {
	let home_dir = dirs::home_dir().ok_or(EnvflowError::HomeDirectoryNotFound)?;
	Ok(home_dir.join(OPTIONS_FILENAME))
}
