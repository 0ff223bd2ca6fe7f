use std::path::PathBuf;

/// Library-level structured errors for envflow.
///
/// Use `thiserror` for structured errors that library consumers can match on.
/// The CLI binary wraps these with `anyhow` for rich context chains.
#[derive(Debug, thiserror::Error)]
pub enum EnvflowError {
	#[error("Failed to read env file: {path}")]
	FileRead {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Env file is not valid {encoding}: {path}")]
	Decode { path: PathBuf, encoding: String },

	#[error("Unknown encoding: {label}")]
	UnknownEncoding { label: String },

	#[error("no \".env*\" files matching pattern \"{pattern}\" in \"{path}\" dir")]
	NoMatchingFiles { pattern: String, path: PathBuf },

	#[error("Cyclic variable reference: {name}")]
	CyclicReference { name: String },

	#[error("Value of {key} contains a NUL byte")]
	NulInValue { key: String },

	#[error("Failed to read options file: {path}")]
	OptionsRead {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to parse options file: {path}")]
	OptionsParse {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	#[error("Command execution failed: {command}")]
	CommandFailed {
		command: String,
		#[source]
		source: std::io::Error,
	},

	#[error("Command not found: {command}")]
	CommandNotFound { command: String },

	#[error("Failed to resolve home directory")]
	HomeDirectoryNotFound,
}

/// Result type alias using EnvflowError.
pub type Result<T> = std::result::Result<T, EnvflowError>;
