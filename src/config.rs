//! Configuration loader and schema types.
//!
//! This module exposes the settings schema that drives a run and helpers to
//! load it from disk and the environment.

mod load;
mod schema;

pub use schema::*;
