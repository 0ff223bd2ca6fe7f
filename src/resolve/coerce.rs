use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// A value after coercion.
///
/// Environment stores only hold strings, so every variant renders back to
/// its storage form through [`fmt::Display`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TypedValue {
	Boolean(bool),
	Number(f64),
	Array(Vec<Value>),
	Object(Map<String, Value>),
	String(String),
}

impl fmt::Display for TypedValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			TypedValue::Boolean(b) => write!(f, "{b}"),
			// -0 renders as 0
			TypedValue::Number(n) if *n == 0.0 => f.write_str("0"),
			TypedValue::Number(n) => write!(f, "{n}"),
			TypedValue::Array(items) => {
				let json = serde_json::to_string(items).map_err(|_| fmt::Error)?;
				f.write_str(&json)
			}
			TypedValue::Object(map) => {
				let json = serde_json::to_string(map).map_err(|_| fmt::Error)?;
				f.write_str(&json)
			}
			TypedValue::String(s) => f.write_str(s),
		}
	}
}

/// Coerce an interpolated string into a typed value.
///
/// Checked in order, first match wins:
/// 1. `\$` is unescaped to `$`
/// 2. `` `...` `` returns the inner text verbatim
/// 3. a trailing `*` is stripped and the rest returned verbatim
/// 4. `true` / `false` (any case)
/// 5. finite numbers
/// 6. JSON arrays and objects (empty on decode failure)
/// 7. anything else as a string
pub fn coerce(raw: &str) -> TypedValue {
	let text = raw.replace("\\$", "$");

	if text.starts_with('`') && text.ends_with('`') {
		let inner = if text.len() >= 2 {
			&text[1..text.len() - 1]
		} else {
			""
		};
		return TypedValue::String(inner.to_string());
	}

	if let Some(masked) = text.strip_suffix('*') {
		return TypedValue::String(masked.to_string());
	}

	if text.eq_ignore_ascii_case("true") {
		return TypedValue::Boolean(true);
	}
	if text.eq_ignore_ascii_case("false") {
		return TypedValue::Boolean(false);
	}

	if let Some(number) = parse_number(&text) {
		return TypedValue::Number(number);
	}

	if text.starts_with('[') && text.ends_with(']') {
		return match serde_json::from_str(&text) {
			Ok(Value::Array(items)) => TypedValue::Array(items),
			_ => TypedValue::Array(Vec::new()),
		};
	}

	if text.starts_with('{') && text.ends_with('}') {
		return match serde_json::from_str(&text) {
			Ok(Value::Object(map)) => TypedValue::Object(map),
			_ => TypedValue::Object(Map::new()),
		};
	}

	TypedValue::String(text)
}

/// Parse decimal, exponent and `0x`/`0o`/`0b` literals; whitespace around
/// the number is allowed, non-finite results are rejected.
fn parse_number(text: &str) -> Option<f64> {
	let trimmed = text.trim();
	if trimmed.is_empty() {
		return None;
	}

	let lower = trimmed.to_ascii_lowercase();
	for (prefix, radix) in [("0x", 16), ("0o", 8), ("0b", 2)] {
		if let Some(digits) = lower.strip_prefix(prefix) {
			if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
				return None;
			}
			return u64::from_str_radix(digits, radix).ok().map(|n| n as f64);
		}
	}

	// Keeps `inf`, `nan` and friends out; those parse as f64 in Rust
	let is_decimal = trimmed
		.bytes()
		.all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'));
	if !is_decimal {
		return None;
	}

	trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}
