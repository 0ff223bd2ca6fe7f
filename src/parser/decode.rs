use once_cell::sync::Lazy;
use regex::Regex;

static CONTINUATION: Lazy<Regex> =
	Lazy::new(|| Regex::new(r"\\\n\s*").expect("valid continuation regex"));

/// Quote style a value was written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quote {
	/// `'...'`: literal.
	Single,
	/// `"..."`: escape sequences decoded.
	Double,
	/// `` `...` ``: literal.
	Backtick,
}

impl Quote {
	pub fn from_char(c: char) -> Option<Self> {
		match c {
			'\'' => Some(Quote::Single),
			'"' => Some(Quote::Double),
			'`' => Some(Quote::Backtick),
			_ => None,
		}
	}

	pub fn as_char(self) -> char {
		match self {
			Quote::Single => '\'',
			Quote::Double => '"',
			Quote::Backtick => '`',
		}
	}
}

/// Decode a value at commit time.
///
/// `quote` is the style the value was opened with; quoted content arrives
/// with its quotes already stripped.
pub fn decode_value(raw: &str, quote: Option<Quote>) -> String {
	match quote {
		Some(Quote::Double) => unescape_double_quoted(raw),
		Some(Quote::Single) | Some(Quote::Backtick) => raw.to_string(),
		None => {
			let trimmed = raw.trim();
			if trimmed.is_empty() {
				return String::new();
			}
			CONTINUATION.replace_all(trimmed, "").into_owned()
		}
	}
}

/// Byte offset of the first `quote` not preceded by a backslash.
pub fn find_unescaped(text: &str, quote: char) -> Option<usize> {
	let mut prev = None;
	for (idx, c) in text.char_indices() {
		if c == quote && prev != Some('\\') {
			return Some(idx);
		}
		prev = Some(c);
	}
	None
}

fn unescape_double_quoted(content: &str) -> String {
	let mut out = String::with_capacity(content.len());
	let mut chars = content.chars().peekable();

	while let Some(c) = chars.next() {
		if c != '\\' {
			out.push(c);
			continue;
		}

		let decoded = match chars.peek() {
			Some('n') => '\n',
			Some('r') => '\r',
			Some('t') => '\t',
			Some('\\') => '\\',
			Some('"') => '"',
			// Unknown escapes (including `\$`) stay as written
			_ => {
				out.push('\\');
				continue;
			}
		};
		chars.next();
		out.push(decoded);
	}

	out
}
