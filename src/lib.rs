//! envflow - cascading `.env` file loader.
//!
//! This library provides the core functionality for envflow, including:
//! - File cascade discovery from a naming pattern and environment name
//! - Env file parsing with quoting, escaping and continuation lines
//! - Variable interpolation and value coercion
//! - Safe merging into an environment store that never clobbers existing values
//!
//! # Example
//!
//! ```no_run
//! use envflow::loader::{Options, config};
//! use envflow::store::ProcessEnv;
//!
//! let options = Options {
//!     node_env: Some("development".to_string()),
//!     ..Default::default()
//! };
//!
//! let resolved = config(&options, &mut ProcessEnv).unwrap();
//! for (key, value) in &resolved {
//!     println!("{key}={value}");
//! }
//! ```

pub mod error;
pub mod exec;
pub mod loader;
pub mod parser;
pub mod pattern;
pub mod resolve;
pub mod store;

pub use error::{EnvflowError, Result};
pub use loader::{Options, ResolvedMap, config, load, unload};
pub use store::{EnvStore, MemoryEnv, ProcessEnv};
