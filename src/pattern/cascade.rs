use crate::pattern::compose::{
	DEFAULT_PATTERN, DEFAULTS_FILENAME, Placeholders, compose_filename, has_local_placeholder,
	has_node_env_placeholder,
};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment name for which local overrides are never loaded.
const TEST_ENV: &str = "test";

/// List the existing env files for `pattern` in cascade order.
///
/// The cascade order, from lowest to highest priority, is:
/// 1. `.env.defaults` (only for the default pattern)
/// 2. the base file (all placeholders off)
/// 3. the local variant (skipped for the `test` environment)
/// 4. the environment variant
/// 5. the environment + local variant
///
/// Only files that exist are returned, resolved against `base_path`.
pub fn list_files(pattern: &str, node_env: Option<&str>, base_path: &Path) -> Vec<PathBuf> {
	debug!("listing effective `.env*` files");

	let node_env = node_env.filter(|env| !env.is_empty());
	let has_local = has_local_placeholder(pattern);

	let mut candidates: Vec<String> = Vec::with_capacity(5);

	if pattern == DEFAULT_PATTERN {
		candidates.push(DEFAULTS_FILENAME.to_string());
	}

	candidates.push(compose_filename(pattern, Placeholders::default()));

	if has_local {
		let local = compose_filename(
			pattern,
			Placeholders {
				local: true,
				node_env: None,
			},
		);

		if node_env != Some(TEST_ENV) {
			candidates.push(local);
		} else if base_path.join(&local).exists() {
			debug!(
				"[!] note that `{}` is being skipped for \"test\" environment",
				local
			);
		}
	}

	if let Some(env) = node_env
		&& has_node_env_placeholder(pattern)
	{
		candidates.push(compose_filename(
			pattern,
			Placeholders {
				local: false,
				node_env: Some(env),
			},
		));

		if has_local {
			candidates.push(compose_filename(
				pattern,
				Placeholders {
					local: true,
					node_env: Some(env),
				},
			));
		}
	}

	candidates
		.iter()
		.map(|name| absolutize(&base_path.join(name)))
		.filter(|path| {
			let exists = path.exists();
			if exists {
				debug!(">> {}", path.display());
			}
			exists
		})
		.collect()
}

/// Resolve an explicit list of files against `base_path`, skipping missing ones.
pub fn existing_files<S: AsRef<str>>(files: &[S], base_path: &Path) -> Vec<PathBuf> {
	files
		.iter()
		.map(|name| absolutize(&base_path.join(name.as_ref())))
		.filter(|path| {
			let exists = path.exists();
			if !exists {
				debug!(">> {} does not exist, skipping", path.display());
			}
			exists
		})
		.collect()
}

fn absolutize(path: &Path) -> PathBuf {
	std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
