//! Env file parsing for envflow.
//!
//! This module handles:
//! - Line scanning with quoting, escaping and continuation lines
//! - Value decoding per quote style
//! - Reading files in a selectable encoding

pub mod decode;
pub mod file;
pub mod line;

pub use decode::{Quote, decode_value};
pub use file::{parse_file, parse_files, resolve_encoding};
pub use line::{ParsedMap, parse_str};
