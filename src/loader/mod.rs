//! Loading env files into an environment store.
//!
//! This module handles:
//! - Options (programmatic or from `.envflow.toml`)
//! - Picking the file cascade for the effective environment
//! - Interpolating, coercing and safe-merging parsed values
//! - Unloading previously loaded values

pub mod options;

pub use options::{Options, load_options, parse_options_file, parse_options_str, user_options_path};

use crate::error::{EnvflowError, Result};
use crate::parser::parse_files;
use crate::pattern::{describe_pattern, existing_files, list_files};
use crate::resolve::{TypedValue, coerce, interpolate};
use crate::store::EnvStore;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Values written to the store by a load, with their coerced types.
pub type ResolvedMap = BTreeMap<String, TypedValue>;

/// Load `files` into `store` without overwriting anything already set.
///
/// Files are parsed and merged in order, later files winning. Keys missing
/// from the store are interpolated against a snapshot of the store and the
/// parsed values, coerced, and written back in one merge. On any error the
/// store is left untouched.
pub fn load<S: EnvStore + ?Sized>(
	files: &[PathBuf],
	encoding: Option<&str>,
	store: &mut S,
) -> Result<ResolvedMap> {
	let parsed = parse_files(files, encoding)?;

	debug!("safe-merging parsed environment variables into the environment");

	let committed = store.snapshot();
	let mut resolved = ResolvedMap::new();

	for (key, raw) in &parsed {
		if let Some(existing) = committed.get(key) {
			if existing != raw {
				debug!(
					"environment variable `{}` is predefined and not being overwritten",
					key
				);
			}
			continue;
		}

		debug!(">> {}", key);
		let interpolated = interpolate(key, raw, &committed, &parsed)?;
		resolved.insert(key.clone(), coerce(&interpolated));
	}

	let values: BTreeMap<String, String> = resolved
		.iter()
		.map(|(key, value)| (key.clone(), value.to_string()))
		.collect();

	// Checked up front so a bad value never leaves the store half-written
	if let Some((key, _)) = values.iter().find(|(_, value)| value.contains('\0')) {
		return Err(EnvflowError::NulInValue { key: key.clone() });
	}
	store.merge(&values);

	Ok(resolved)
}

/// Remove variables defined in `files` from `store`.
///
/// Only variables whose current value still equals the raw parsed value are
/// removed. Returns the removed keys.
pub fn unload<S: EnvStore + ?Sized>(
	files: &[PathBuf],
	encoding: Option<&str>,
	store: &mut S,
) -> Result<Vec<String>> {
	let parsed = parse_files(files, encoding)?;

	let mut removed = Vec::new();
	for (key, value) in &parsed {
		if store.get(key).as_deref() == Some(value.as_str()) {
			store.delete(key);
			removed.push(key.clone());
		}
	}

	Ok(removed)
}

/// Effective environment name: `options.node_env`, then the store's
/// `NODE_ENV`, then `options.default_node_env`.
pub fn effective_node_env<S: EnvStore + ?Sized>(options: &Options, store: &S) -> Option<String> {
	if let Some(env) = options.node_env.as_deref().filter(|env| !env.is_empty()) {
		debug!("operating in \"{}\" environment (set by options)", env);
		return Some(env.to_string());
	}

	if let Some(env) = store.get("NODE_ENV").filter(|env| !env.is_empty()) {
		debug!("operating in \"{}\" environment (as per NODE_ENV)", env);
		return Some(env);
	}

	if let Some(env) = options
		.default_node_env
		.as_deref()
		.filter(|env| !env.is_empty())
	{
		debug!("operating in \"{}\" environment (default)", env);
		return Some(env.to_string());
	}

	debug!("operating in \"no environment\" mode");
	None
}

/// Files `config` would load for `options`, in cascade order.
///
/// An explicit `files` list is resolved against the base path with missing
/// entries skipped. Pattern-based listing that finds nothing fails with
/// [`EnvflowError::NoMatchingFiles`].
pub fn resolve_files<S: EnvStore + ?Sized>(options: &Options, store: &S) -> Result<Vec<PathBuf>> {
	let path = options.base_path();

	if let Some(files) = &options.files {
		debug!("using explicit list of `.env*` files: {}", files.join(", "));
		return Ok(existing_files(files.as_slice(), &path));
	}

	let node_env = effective_node_env(options, store);
	let pattern = options.pattern();
	let files = list_files(pattern, node_env.as_deref(), &path);

	if files.is_empty() {
		return Err(EnvflowError::NoMatchingFiles {
			pattern: describe_pattern(pattern, node_env.as_deref()),
			path,
		});
	}

	Ok(files)
}

/// Load the env file cascade described by `options` into `store`.
///
/// Failures are logged as warnings unless `options.silent` is set, and are
/// returned either way.
pub fn config<S: EnvStore + ?Sized>(options: &Options, store: &mut S) -> Result<ResolvedMap> {
	debug!(?options, "initializing");

	let encoding = options.encoding.as_deref();

	if options.purge_dotenv {
		debug!("purge-dotenv is enabled, unloading potentially pre-loaded `.env`");
		let dotenv = options.base_path().join(".env");
		if dotenv.exists()
			&& let Err(error) = unload(&[dotenv], encoding, store)
		{
			report_failure(&error, options.silent);
		}
	}

	let result = resolve_files(options, store).and_then(|files| load(&files, encoding, store));

	match &result {
		Ok(_) => debug!("initialization completed"),
		Err(error) => report_failure(error, options.silent),
	}

	result
}

fn report_failure(error: &EnvflowError, silent: bool) {
	if !silent {
		warn!("\".env*\" files loading failed: {}", error);
	}
}
