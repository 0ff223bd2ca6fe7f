use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// The naming pattern used when none is configured.
pub const DEFAULT_PATTERN: &str = ".env[.node_env][.local]";

/// Legacy defaults file probed only for [`DEFAULT_PATTERN`].
pub const DEFAULTS_FILENAME: &str = ".env.defaults";

static LOCAL_PLACEHOLDER: Lazy<Regex> =
	Lazy::new(|| Regex::new(r"\[(\W*\blocal\b\W*)\]").expect("valid local placeholder regex"));

static NODE_ENV_PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
	Regex::new(r"\[(\W*\b)node_env(\b\W*)\]").expect("valid node_env placeholder regex")
});

/// Which placeholders of a pattern are switched on.
#[derive(Debug, Clone, Copy, Default)]
pub struct Placeholders<'a> {
	/// Emit the `[...local...]` bracket contents.
	pub local: bool,

	/// Environment name substituted into the `[...node_env...]` bracket.
	pub node_env: Option<&'a str>,
}

/// Compose a filename from a naming pattern.
///
/// Active placeholders keep their bracket's decoration with the brackets
/// stripped; inactive ones are removed entirely.
pub fn compose_filename(pattern: &str, placeholders: Placeholders<'_>) -> String {
	let filename = if placeholders.local {
		LOCAL_PLACEHOLDER.replace_all(pattern, "${1}")
	} else {
		LOCAL_PLACEHOLDER.replace_all(pattern, "")
	};

	match placeholders.node_env.filter(|env| !env.is_empty()) {
		Some(env) => NODE_ENV_PLACEHOLDER
			.replace_all(&filename, |caps: &Captures| {
				format!("{}{}{}", &caps[1], env, &caps[2])
			})
			.into_owned(),
		None => NODE_ENV_PLACEHOLDER.replace_all(&filename, "").into_owned(),
	}
}

/// Fill the `node_env` keyword in with `env` while keeping the brackets.
///
/// Used for error messages, so the reader sees which files were expected.
pub fn describe_pattern(pattern: &str, node_env: Option<&str>) -> String {
	match node_env.filter(|env| !env.is_empty()) {
		Some(env) => NODE_ENV_PLACEHOLDER
			.replace_all(pattern, |caps: &Captures| {
				format!("[{}{}{}]", &caps[1], env, &caps[2])
			})
			.into_owned(),
		None => pattern.to_string(),
	}
}

pub fn has_local_placeholder(pattern: &str) -> bool {
	LOCAL_PLACEHOLDER.is_match(pattern)
}

pub fn has_node_env_placeholder(pattern: &str) -> bool {
	NODE_ENV_PLACEHOLDER.is_match(pattern)
}
