//! Rename planning: metadata in, destination path and action out.
//!
//! [`Planner::propose`] substitutes escaped metadata values into a compiled
//! pattern. [`Planner::decide`] compares the proposal with the filesystem and,
//! outside plan-only runs, copies or moves the file without ever replacing an
//! existing destination.

mod commit;
mod escape;
mod metadata;
mod plan;

pub use commit::{RetryPolicy, Transfer};
pub use metadata::{MetadataRecord, add_file_keys, keys, normalize};
pub use plan::{MissingPolicy, Planner};
