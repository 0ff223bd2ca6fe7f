//! Value resolution for envflow.
//!
//! This module handles:
//! - `$NAME` / `${NAME:-default}` interpolation
//! - Coercion of interpolated strings into typed values

pub mod coerce;
pub mod interpolate;

pub use coerce::{TypedValue, coerce};
pub use interpolate::interpolate;
