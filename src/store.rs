//! Environment stores that env files are loaded into.
//!
//! The loader never touches `std::env` directly; it works through
//! [`EnvStore`] so tests and embedders can load into an in-memory map.

use std::collections::{BTreeMap, HashMap};

/// A key/value string store standing in for the process environment.
pub trait EnvStore {
	/// Copy of every variable currently set.
	fn snapshot(&self) -> HashMap<String, String>;

	/// Current value of `key`, if set.
	fn get(&self, key: &str) -> Option<String>;

	/// Set every entry of `values`, replacing existing values.
	///
	/// Values must not contain NUL bytes.
	fn merge(&mut self, values: &BTreeMap<String, String>);

	/// Remove `key` if present.
	fn delete(&mut self, key: &str);
}

/// The real process environment.
///
/// Mutating the process environment is only sound while no other thread
/// reads or writes it; callers must load before spawning threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvStore for ProcessEnv {
	fn snapshot(&self) -> HashMap<String, String> {
		// Non-unicode variables are kept lossily so they still count as set
		std::env::vars_os()
			.map(|(key, value)| {
				(
					key.to_string_lossy().into_owned(),
					value.to_string_lossy().into_owned(),
				)
			})
			.collect()
	}

	fn get(&self, key: &str) -> Option<String> {
		std::env::var_os(key).map(|value| value.to_string_lossy().into_owned())
	}

	fn merge(&mut self, values: &BTreeMap<String, String>) {
		for (key, value) in values {
			// SAFETY: see the type-level docs; loading happens before threads start
			unsafe { std::env::set_var(key, value) };
		}
	}

	fn delete(&mut self, key: &str) {
		// SAFETY: see the type-level docs; loading happens before threads start
		unsafe { std::env::remove_var(key) };
	}
}

/// An in-memory environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryEnv {
	vars: HashMap<String, String>,
}

impl MemoryEnv {
	pub fn new() -> Self {
		Self::default()
	}

	/// Seed the store with the current process environment.
	pub fn from_process() -> Self {
		Self {
			vars: ProcessEnv.snapshot(),
		}
	}

	pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
		self.vars.insert(key.into(), value.into());
	}

	pub fn len(&self) -> usize {
		self.vars.len()
	}

	pub fn is_empty(&self) -> bool {
		self.vars.is_empty()
	}
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MemoryEnv {
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		Self {
			vars: iter
				.into_iter()
				.map(|(key, value)| (key.into(), value.into()))
				.collect(),
		}
	}
}

impl EnvStore for MemoryEnv {
	fn snapshot(&self) -> HashMap<String, String> {
		self.vars.clone()
	}

	fn get(&self, key: &str) -> Option<String> {
		self.vars.get(key).cloned()
	}

	fn merge(&mut self, values: &BTreeMap<String, String>) {
		self.vars
			.extend(values.iter().map(|(k, v)| (k.clone(), v.clone())));
	}

	fn delete(&mut self, key: &str) {
		self.vars.remove(key);
	}
}
