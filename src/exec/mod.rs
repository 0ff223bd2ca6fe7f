//! Running commands with the loaded environment.
//!
//! This module handles:
//! - Executing the wrapped command with inherited stdio and environment
//! - Exit code propagation

use crate::error::{EnvflowError, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

/// Execute a command with the current process environment.
///
/// This function:
/// - Passes stdin, stdout, stderr through to the child process
/// - Returns the exit status of the child process
pub fn execute_command(binary: &Path, args: &[String]) -> Result<ExitStatus> {
	let mut cmd = Command::new(binary);
	cmd.args(args)
		.stdin(Stdio::inherit())
		.stdout(Stdio::inherit())
		.stderr(Stdio::inherit());

	cmd.status().map_err(|source| {
		let command = binary.to_string_lossy().to_string();
		if source.kind() == std::io::ErrorKind::NotFound {
			EnvflowError::CommandNotFound { command }
		} else {
			EnvflowError::CommandFailed { command, source }
		}
	})
}

/// Resolve a command name to its full path.
///
/// Paths containing a separator are used as-is if they exist.
/// Otherwise, searches PATH for the command, so a `PATH` set by a loaded
/// env file is honored.
pub fn resolve_command(command: &str) -> Option<PathBuf> {
	let path = Path::new(command);

	if path.components().count() > 1 || path.is_absolute() {
		return path.exists().then(|| path.to_path_buf());
	}

	let path_var = std::env::var_os("PATH")?;
	std::env::split_paths(&path_var)
		.map(|dir| dir.join(command))
		.find(|full_path| full_path.is_file())
}
