use crate::error::{EnvflowError, Result};
use crate::parser::line::{ParsedMap, parse_str};
use encoding_rs::{Encoding, UTF_8};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Look up an encoding by its WHATWG label, defaulting to UTF-8.
pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
	match label {
		None => Ok(UTF_8),
		Some(label) => {
			Encoding::for_label(label.trim().as_bytes()).ok_or_else(|| {
				EnvflowError::UnknownEncoding {
					label: label.to_string(),
				}
			})
		}
	}
}

/// Parse an env file from the given path.
pub fn parse_file(path: &Path, encoding: Option<&str>) -> Result<ParsedMap> {
	let encoding = resolve_encoding(encoding)?;
	read_and_parse(path, encoding)
}

/// Parse several env files and merge them in the given order.
///
/// Keys from later files replace keys from earlier ones.
pub fn parse_files(paths: &[PathBuf], encoding: Option<&str>) -> Result<ParsedMap> {
	let encoding = resolve_encoding(encoding)?;

	let mut merged = ParsedMap::new();
	for path in paths {
		merged.extend(read_and_parse(path, encoding)?);
	}
	Ok(merged)
}

fn read_and_parse(path: &Path, encoding: &'static Encoding) -> Result<ParsedMap> {
	debug!("parsing \"{}\"", path.display());

	let bytes = std::fs::read(path).map_err(|source| EnvflowError::FileRead {
		path: path.to_path_buf(),
		source,
	})?;

	// `decode` sniffs a BOM before falling back to `encoding`
	let (content, used, had_errors) = encoding.decode(&bytes);
	if had_errors {
		return Err(EnvflowError::Decode {
			path: path.to_path_buf(),
			encoding: used.name().to_string(),
		});
	}

	let parsed = parse_str(&content);
	for (key, value) in &parsed {
		debug!(">> {}={}", key, value);
	}
	Ok(parsed)
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::fs;

	#[test]
	fn test_parse_file_utf8() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join(".env");
		fs::write(&path, "GREETING=héllo\n").unwrap();

		let parsed = parse_file(&path, None).unwrap();
		assert_eq!(parsed.get("GREETING").unwrap(), "héllo");
	}

	#[test]
	fn test_parse_file_latin1() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join(".env");
		// "café" in ISO-8859-1
		fs::write(&path, b"DRINK=caf\xe9\n").unwrap();

		let parsed = parse_file(&path, Some("latin1")).unwrap();
		assert_eq!(parsed.get("DRINK").unwrap(), "café");
	}

	#[test]
	fn test_parse_file_utf8_bom() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join(".env");
		fs::write(&path, b"\xef\xbb\xbfFIRST=one\nSECOND=two\n").unwrap();

		let parsed = parse_file(&path, None).unwrap();
		assert_eq!(parsed.get("FIRST").unwrap(), "one");
		assert_eq!(parsed.get("SECOND").unwrap(), "two");
	}

	#[test]
	fn test_parse_file_utf16le_bom_overrides_label() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join(".env");
		let mut bytes = vec![0xff, 0xfe];
		bytes.extend("DRINK=café\n".encode_utf16().flat_map(u16::to_le_bytes));
		fs::write(&path, bytes).unwrap();

		let parsed = parse_file(&path, Some("latin1")).unwrap();
		assert_eq!(parsed.get("DRINK").unwrap(), "café");
	}

	#[test]
	fn test_parse_file_invalid_utf8() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join(".env");
		fs::write(&path, b"DRINK=caf\xe9\n").unwrap();

		match parse_file(&path, None).unwrap_err() {
			EnvflowError::Decode { encoding, .. } => assert_eq!(encoding, "UTF-8"),
			other => panic!("Expected Decode error, got {other:?}"),
		}
	}

	#[test]
	fn test_parse_file_missing() {
		let result = parse_file(Path::new("/nonexistent/envflow/.env"), None);
		match result.unwrap_err() {
			EnvflowError::FileRead { path, .. } => {
				assert_eq!(path, PathBuf::from("/nonexistent/envflow/.env"));
			}
			other => panic!("Expected FileRead error, got {other:?}"),
		}
	}

	#[test]
	fn test_unknown_encoding() {
		match resolve_encoding(Some("klingon")).unwrap_err() {
			EnvflowError::UnknownEncoding { label } => assert_eq!(label, "klingon"),
			other => panic!("Expected UnknownEncoding error, got {other:?}"),
		}
	}

	#[test]
	fn test_parse_files_overwrite_in_order() {
		let dir = tempfile::tempdir().unwrap();
		let first = dir.path().join(".env");
		let second = dir.path().join(".env.local");
		fs::write(&first, "A=base\nB=base\n").unwrap();
		fs::write(&second, "B=local\nC=local\n").unwrap();

		let parsed = parse_files(&[first, second], None).unwrap();
		assert_eq!(parsed.get("A").unwrap(), "base");
		assert_eq!(parsed.get("B").unwrap(), "local");
		assert_eq!(parsed.get("C").unwrap(), "local");
	}

	#[test]
	fn test_parse_files_aborts_on_missing_file() {
		let dir = tempfile::tempdir().unwrap();
		let first = dir.path().join(".env");
		fs::write(&first, "A=1\n").unwrap();

		let result = parse_files(&[first, dir.path().join("gone")], None);
		assert!(matches!(result, Err(EnvflowError::FileRead { .. })));
	}
}
