//! Env file discovery for envflow.
//!
//! This module handles:
//! - Naming pattern placeholders (`[.local]`, `[.node_env]`)
//! - Cascade ordering and existence filtering

pub mod cascade;
pub mod compose;

pub use cascade::{existing_files, list_files};
pub use compose::{DEFAULT_PATTERN, Placeholders, compose_filename, describe_pattern};
