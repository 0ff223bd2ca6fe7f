use crate::error::{EnvflowError, Result};
use crate::parser::ParsedMap;
use std::collections::HashMap;

/// A variable reference found after a `$`.
#[derive(Debug, PartialEq, Eq)]
struct Token<'a> {
	name: &'a str,
	default: Option<&'a str>,
	/// Bytes consumed after the `$`.
	len: usize,
}

fn is_name_byte(b: u8) -> bool {
	b.is_ascii_alphanumeric() || b == b'_' || b == b'.'
}

/// Parse the reference following a `$`: `NAME`, `{NAME}`, `{NAME:-default}`
/// or `{NAME-default}`.
fn parse_token(input: &str) -> Option<Token<'_>> {
	let bytes = input.as_bytes();

	if bytes.first() != Some(&b'{') {
		let len = bytes.iter().take_while(|b| is_name_byte(**b)).count();
		if len == 0 {
			return None;
		}
		return Some(Token {
			name: &input[..len],
			default: None,
			len,
		});
	}

	let name_len = bytes[1..].iter().take_while(|b| is_name_byte(**b)).count();
	if name_len == 0 {
		return None;
	}
	let name = &input[1..1 + name_len];
	let mut pos = 1 + name_len;

	match bytes.get(pos) {
		Some(b'}') => {
			return Some(Token {
				name,
				default: None,
				len: pos + 1,
			});
		}
		Some(b':') if bytes.get(pos + 1) == Some(&b'-') => pos += 2,
		Some(b'-') => pos += 1,
		_ => return None,
	}

	// The default runs to the matching `}`, skipping nested `${...}`
	let start = pos;
	let mut depth = 0usize;
	while pos < bytes.len() {
		match bytes[pos] {
			b'$' if bytes.get(pos + 1) == Some(&b'{') => {
				depth += 1;
				pos += 2;
				continue;
			}
			b'}' if depth == 0 => {
				return Some(Token {
					name,
					default: Some(&input[start..pos]),
					len: pos + 1,
				});
			}
			b'}' => depth -= 1,
			_ => {}
		}
		pos += 1;
	}

	None
}

/// Expands references against the committed environment and parsed values.
struct Resolver<'a> {
	committed: &'a HashMap<String, String>,
	parsed: &'a ParsedMap,
	/// Names currently being expanded, outermost first.
	chain: Vec<String>,
}

impl Resolver<'_> {
	fn expand(&mut self, value: &str) -> Result<String> {
		let mut out = String::with_capacity(value.len());
		let mut rest = value;

		while let Some(pos) = rest.find('$') {
			let before = &rest[..pos];
			let after = &rest[pos + 1..];

			if let Some(prefix) = before.strip_suffix('\\') {
				// `\$` is a literal dollar, the reference after it is copied as-is
				out.push_str(prefix);
				out.push('$');
				let skip = if after.starts_with('(') {
					0
				} else {
					parse_token(after).map_or(0, |token| token.len)
				};
				out.push_str(&after[..skip]);
				rest = &after[skip..];
				continue;
			}

			out.push_str(before);

			if after.starts_with('(') {
				out.push('$');
				rest = after;
				continue;
			}

			match parse_token(after) {
				Some(token) => {
					out.push_str(&self.resolve(&token, value)?);
					rest = &after[token.len..];
				}
				None => {
					out.push('$');
					rest = after;
				}
			}
		}

		out.push_str(rest);
		Ok(out)
	}

	fn resolve(&mut self, token: &Token<'_>, current: &str) -> Result<String> {
		let (committed_env, parsed_map) = (self.committed, self.parsed);
		let name = token.name;

		if let Some(committed) = committed_env.get(name).filter(|v| !v.is_empty()) {
			if parsed_map.get(name) == Some(committed) {
				return Ok(committed.clone());
			}
			return self.descend(name, committed);
		}

		if let Some(parsed) = parsed_map.get(name).filter(|v| !v.is_empty())
			&& parsed != current
		{
			return self.descend(name, parsed);
		}

		match token.default.filter(|d| !d.is_empty()) {
			Some(default) if default.starts_with('$') => self.expand(default),
			Some(default) => Ok(default.to_string()),
			None => Ok(String::new()),
		}
	}

	fn descend(&mut self, name: &str, value: &str) -> Result<String> {
		if self.chain.iter().any(|seen| seen == name) {
			return Err(EnvflowError::CyclicReference {
				name: name.to_string(),
			});
		}

		self.chain.push(name.to_string());
		let expanded = self.expand(value);
		self.chain.pop();
		expanded
	}
}

/// Substitute `$NAME`, `${NAME}`, `${NAME:-default}` and `${NAME-default}`
/// references in the raw value of `key`.
///
/// Non-empty committed values win over parsed ones. A parsed value is only
/// followed when it differs from the value being expanded, and following a
/// name that is already being expanded fails with
/// [`EnvflowError::CyclicReference`].
pub fn interpolate(
	key: &str,
	raw: &str,
	committed: &HashMap<String, String>,
	parsed: &ParsedMap,
) -> Result<String> {
	let mut resolver = Resolver {
		committed,
		parsed,
		chain: vec![key.to_string()],
	};
	resolver.expand(raw)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn map(pairs: &[(&str, &str)]) -> ParsedMap {
		pairs
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect()
	}

	fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
		pairs
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect()
	}

	fn expand(key: &str, committed: &[(&str, &str)], parsed: &[(&str, &str)]) -> Result<String> {
		let parsed = map(parsed);
		let raw = parsed.get(key).cloned().unwrap_or_default();
		interpolate(key, &raw, &env(committed), &parsed)
	}

	#[test]
	fn test_parse_token_shapes() {
		assert_eq!(
			parse_token("HOME/bin"),
			Some(Token {
				name: "HOME",
				default: None,
				len: 4
			})
		);
		assert_eq!(
			parse_token("{HOME}x"),
			Some(Token {
				name: "HOME",
				default: None,
				len: 6
			})
		);
		assert_eq!(
			parse_token("{A:-b c}"),
			Some(Token {
				name: "A",
				default: Some("b c"),
				len: 8
			})
		);
		assert_eq!(
			parse_token("{A-b}"),
			Some(Token {
				name: "A",
				default: Some("b"),
				len: 5
			})
		);
		assert_eq!(
			parse_token("{A:-${B:-${C}}}tail").map(|t| t.default),
			Some(Some("${B:-${C}}"))
		);
		assert_eq!(parse_token("{UNCLOSED"), None);
		assert_eq!(parse_token(" nothing"), None);
		assert_eq!(parse_token("{}"), None);
	}

	#[test]
	fn test_plain_value_unchanged() {
		assert_eq!(expand("A", &[], &[("A", "no refs here")]).unwrap(), "no refs here");
	}

	#[test]
	fn test_reference_to_parsed_value() {
		let result = expand(
			"URL",
			&[],
			&[("HOST", "localhost"), ("URL", "http://$HOST:${PORT:-80}/")],
		);
		assert_eq!(result.unwrap(), "http://localhost:80/");
	}

	#[test]
	fn test_missing_with_default() {
		assert_eq!(expand("A", &[], &[("A", "${MISSING:-fallback}")]).unwrap(), "fallback");
		assert_eq!(expand("A", &[], &[("A", "${MISSING-fallback}")]).unwrap(), "fallback");
	}

	#[test]
	fn test_missing_without_default_is_empty() {
		assert_eq!(expand("A", &[], &[("A", "[${MISSING}]")]).unwrap(), "[]");
	}

	#[test]
	fn test_committed_wins_over_parsed() {
		let result = expand("B", &[("A", "1")], &[("A", "2"), ("B", "${A}")]);
		assert_eq!(result.unwrap(), "1");
	}

	#[test]
	fn test_empty_committed_value_falls_through() {
		let result = expand("B", &[("A", "")], &[("A", "from-file"), ("B", "${A}")]);
		assert_eq!(result.unwrap(), "from-file");
	}

	#[test]
	fn test_committed_value_is_expanded() {
		let result = expand("B", &[("A", "$HOME/x"), ("HOME", "/home/me")], &[("B", "${A}")]);
		assert_eq!(result.unwrap(), "/home/me/x");
	}

	#[test]
	fn test_recursive_parsed_references() {
		let result = expand(
			"C",
			&[],
			&[("A", "a"), ("B", "${A}b"), ("C", "${B}c")],
		);
		assert_eq!(result.unwrap(), "abc");
	}

	#[test]
	fn test_default_starting_with_dollar_is_expanded() {
		let result = expand("A", &[], &[("B", "bee"), ("A", "${MISSING:-$B}")]);
		assert_eq!(result.unwrap(), "bee");

		let nested = expand("A", &[], &[("C", "sea"), ("A", "${X:-${Y:-${C}}}")]);
		assert_eq!(nested.unwrap(), "sea");

		let deep = expand("A", &[], &[("C", "sea"), ("A", "${X:-${Y:-${Z:-${C}}}}")]);
		assert_eq!(deep.unwrap(), "sea");

		let literal = expand("A", &[], &[("A", "${X:-${Y:-${Z:-deep}}}")]);
		assert_eq!(literal.unwrap(), "deep");
	}

	#[test]
	fn test_default_not_starting_with_dollar_is_literal() {
		let result = expand("A", &[], &[("B", "bee"), ("A", "${MISSING:-x$B}")]);
		assert_eq!(result.unwrap(), "x$B");
	}

	#[test]
	fn test_escaped_dollar_is_literal() {
		let result = expand("A", &[], &[("B", "bee"), ("A", r"cost \$B and \${B:-$B}")]);
		assert_eq!(result.unwrap(), "cost $B and ${B:-$B}");
	}

	#[test]
	fn test_command_substitution_is_not_a_reference() {
		assert_eq!(expand("A", &[], &[("A", "$(whoami)")]).unwrap(), "$(whoami)");
	}

	#[test]
	fn test_lone_dollar_and_unclosed_brace() {
		assert_eq!(expand("A", &[], &[("A", "5$ and ${OPEN")]).unwrap(), "5$ and ${OPEN");
	}

	#[test]
	fn test_self_reference_uses_default() {
		assert_eq!(expand("A", &[], &[("A", "${A:-seed}")]).unwrap(), "seed");
	}

	#[test]
	fn test_mutual_reference_is_cyclic() {
		let result = expand("A", &[], &[("A", "x${B}"), ("B", "${A}y")]);
		match result.unwrap_err() {
			EnvflowError::CyclicReference { name } => assert_eq!(name, "A"),
			other => panic!("Expected CyclicReference error, got {other:?}"),
		}
	}

	#[test]
	fn test_repeated_reference_is_not_cyclic() {
		let result = expand("A", &[], &[("B", "b"), ("A", "${B}-${B}")]);
		assert_eq!(result.unwrap(), "b-b");
	}

	#[test]
	fn test_dotted_names() {
		let result = expand("A", &[("app.name", "demo")], &[("A", "${app.name}")]);
		assert_eq!(result.unwrap(), "demo");
	}
}
