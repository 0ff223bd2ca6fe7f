use crate::parser::decode::{Quote, decode_value, find_unescaped};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

/// Raw key/value pairs as written in env files, before interpolation.
pub type ParsedMap = BTreeMap<String, String>;

static KEY_LINE: Lazy<Regex> = Lazy::new(|| {
	Regex::new(r"^\s*(?:export\s+)?([A-Za-z_][A-Za-z0-9_]*)\s*=\s*").expect("valid key regex")
});

/// Parser state between lines.
#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
	/// Waiting for a `KEY=value` line.
	ExpectKey,

	/// Inside a quoted value spanning several lines.
	InQuotedValue {
		key: String,
		quote: Quote,
		lines: Vec<String>,
	},

	/// Inside an unquoted value continued with trailing backslashes.
	InUnquotedContinuation { key: String, lines: Vec<String> },
}

/// A fully resolved `(key, value)` pair.
type Committed = Option<(String, String)>;

impl State {
	/// Feed one line, returning the next state and any committed entry.
	fn step(self, line: &str) -> (State, Committed) {
		let in_quotes = matches!(self, State::InQuotedValue { .. });
		if !in_quotes && is_skippable(line) {
			return (self, None);
		}

		match self {
			State::ExpectKey => expect_key(line),
			State::InQuotedValue { key, quote, lines } => in_quoted_value(key, quote, lines, line),
			State::InUnquotedContinuation { key, lines } => {
				in_unquoted_continuation(key, lines, line)
			}
		}
	}

	/// Commit whatever is still accumulated at end of input.
	fn finish(self) -> Committed {
		match self {
			State::ExpectKey => None,
			State::InQuotedValue { key, quote, lines } if !lines.is_empty() => {
				Some((key, decode_value(&lines.join("\n"), Some(quote))))
			}
			State::InUnquotedContinuation { key, lines } if !lines.is_empty() => {
				Some((key, decode_value(&lines.join("\n"), None)))
			}
			_ => None,
		}
	}
}

fn is_skippable(line: &str) -> bool {
	let trimmed = line.trim();
	trimmed.is_empty() || trimmed.starts_with('#')
}

fn expect_key(line: &str) -> (State, Committed) {
	let Some(caps) = KEY_LINE.captures(line) else {
		// Not a key line; ignored
		return (State::ExpectKey, None);
	};

	let key = caps[1].to_string();
	let value_start = &line[caps[0].len()..];
	let trimmed = value_start.trim();

	if let Some(quote) = trimmed.chars().next().and_then(Quote::from_char) {
		let rest = &trimmed[1..];
		return match find_unescaped(rest, quote.as_char()) {
			Some(end) => (
				State::ExpectKey,
				Some((key, decode_value(&rest[..end], Some(quote)))),
			),
			None => (
				State::InQuotedValue {
					key,
					quote,
					lines: vec![rest.to_string()],
				},
				None,
			),
		};
	}

	match value_start.strip_suffix('\\') {
		Some(head) => (
			State::InUnquotedContinuation {
				key,
				lines: vec![head.trim().to_string()],
			},
			None,
		),
		None => (State::ExpectKey, Some((key, decode_value(value_start, None)))),
	}
}

fn in_quoted_value(
	key: String,
	quote: Quote,
	mut lines: Vec<String>,
	line: &str,
) -> (State, Committed) {
	match find_unescaped(line, quote.as_char()) {
		Some(end) => {
			lines.push(line[..end].to_string());
			let value = decode_value(&lines.join("\n"), Some(quote));
			(State::ExpectKey, Some((key, value)))
		}
		None => {
			lines.push(line.to_string());
			(State::InQuotedValue { key, quote, lines }, None)
		}
	}
}

fn in_unquoted_continuation(
	key: String,
	mut lines: Vec<String>,
	line: &str,
) -> (State, Committed) {
	match line.strip_suffix('\\') {
		Some(head) => {
			lines.push(head.trim().to_string());
			(State::InUnquotedContinuation { key, lines }, None)
		}
		None => {
			lines.push(line.trim().to_string());
			let value = decode_value(&lines.join("\n"), None);
			(State::ExpectKey, Some((key, value)))
		}
	}
}

/// Parse env file content into raw key/value pairs.
///
/// Later definitions of a key replace earlier ones. Lines that are neither
/// blank, comments nor `KEY=value` definitions are ignored.
pub fn parse_str(content: &str) -> ParsedMap {
	let normalized = content.replace("\r\n", "\n").replace('\r', "\n");

	let mut parsed = ParsedMap::new();
	let mut state = State::ExpectKey;

	for line in normalized.split('\n') {
		let (next, committed) = state.step(line);
		if let Some((key, value)) = committed {
			parsed.insert(key, value);
		}
		state = next;
	}

	if let Some((key, value)) = state.finish() {
		parsed.insert(key, value);
	}

	parsed
}

#[cfg(test)]
mod tests {
	use super::*;

	fn get<'a>(parsed: &'a ParsedMap, key: &str) -> &'a str {
		parsed
			.get(key)
			.map(String::as_str)
			.unwrap_or_else(|| panic!("missing key {key}"))
	}

	#[test]
	fn test_simple_pairs() {
		let parsed = parse_str("A=1\nB = two\n  C=  spaced value  \n");
		assert_eq!(get(&parsed, "A"), "1");
		assert_eq!(get(&parsed, "B"), "two");
		assert_eq!(get(&parsed, "C"), "spaced value");
	}

	#[test]
	fn test_export_prefix_is_discarded() {
		let parsed = parse_str("export TOKEN=abc\nexport\tOTHER=def");
		assert_eq!(get(&parsed, "TOKEN"), "abc");
		assert_eq!(get(&parsed, "OTHER"), "def");
		assert!(!parsed.contains_key("export"));
	}

	#[test]
	fn test_comments_blank_and_malformed_lines_ignored() {
		let parsed = parse_str("# comment\n\n   # indented\nnot a pair\n1BAD=x\nGOOD=yes\n");
		assert_eq!(parsed.len(), 1);
		assert_eq!(get(&parsed, "GOOD"), "yes");
	}

	#[test]
	fn test_empty_value() {
		let parsed = parse_str("EMPTY=\nQUOTED=\"\"");
		assert_eq!(get(&parsed, "EMPTY"), "");
		assert_eq!(get(&parsed, "QUOTED"), "");
	}

	#[test]
	fn test_last_definition_wins() {
		let parsed = parse_str("A=first\nA=second");
		assert_eq!(get(&parsed, "A"), "second");
	}

	#[test]
	fn test_double_quoted_escape_newline() {
		let parsed = parse_str(r#"KEY="line1\nline2""#);
		assert_eq!(get(&parsed, "KEY"), "line1\nline2");
	}

	#[test]
	fn test_single_quoted_is_literal() {
		let parsed = parse_str(r"KEY='raw $OTHER \n'");
		assert_eq!(get(&parsed, "KEY"), r"raw $OTHER \n");
	}

	#[test]
	fn test_quoted_value_ignores_trailing_text() {
		let parsed = parse_str(r#"KEY="value" # trailing comment"#);
		assert_eq!(get(&parsed, "KEY"), "value");
	}

	#[test]
	fn test_escaped_quote_inside_double_quotes() {
		let parsed = parse_str(r#"KEY="say \"hi\"""#);
		assert_eq!(get(&parsed, "KEY"), r#"say "hi""#);
	}

	#[test]
	fn test_multiline_double_quoted() {
		let parsed =
			parse_str("CERT=\"-----BEGIN-----\n  abc\n\n# not a comment\n-----END-----\"\nNEXT=1");
		assert_eq!(
			get(&parsed, "CERT"),
			"-----BEGIN-----\n  abc\n\n# not a comment\n-----END-----"
		);
		assert_eq!(get(&parsed, "NEXT"), "1");
	}

	#[test]
	fn test_multiline_backtick_quoted() {
		let parsed = parse_str("JSON=`{\n  \"a\": 1\n}`");
		assert_eq!(get(&parsed, "JSON"), "{\n  \"a\": 1\n}");
	}

	#[test]
	fn test_unquoted_continuation() {
		let parsed = parse_str("LIST=one \\\n   two \\\n three\nAFTER=x");
		assert_eq!(get(&parsed, "LIST"), "one\ntwo\nthree");
		assert_eq!(get(&parsed, "AFTER"), "x");
	}

	#[test]
	fn test_crlf_line_endings() {
		let parsed = parse_str("A=1\r\nB=\"x\r\ny\"\rC=3");
		assert_eq!(get(&parsed, "A"), "1");
		assert_eq!(get(&parsed, "B"), "x\ny");
		assert_eq!(get(&parsed, "C"), "3");
	}

	#[test]
	fn test_unterminated_quote_commits_at_end_of_input() {
		let parsed = parse_str("A=ok\nB='never closed\nstill going");
		assert_eq!(get(&parsed, "A"), "ok");
		assert_eq!(get(&parsed, "B"), "never closed\nstill going");
	}

	#[test]
	fn test_dangling_continuation_commits_at_end_of_input() {
		let parsed = parse_str("A=partial \\");
		assert_eq!(get(&parsed, "A"), "partial");
	}

	#[test]
	fn test_state_machine_transitions() {
		let (state, committed) = State::ExpectKey.step("KEY=\"open");
		assert!(committed.is_none());
		assert_eq!(
			state,
			State::InQuotedValue {
				key: "KEY".to_string(),
				quote: Quote::Double,
				lines: vec!["open".to_string()],
			}
		);

		let (state, committed) = state.step("");
		assert!(committed.is_none());

		let (state, committed) = state.step("close\" ignored");
		assert_eq!(state, State::ExpectKey);
		assert_eq!(committed, Some(("KEY".to_string(), "open\n\nclose".to_string())));
	}
}
