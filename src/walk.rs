//! Source tree traversal.
//!
//! First-level directories can be filtered by name (glob) and modification
//! time; everything below an accepted directory is descended. Each regular,
//! visible file is classified by the tagger and, when actionable, planned.

mod driver;
mod filter;

pub use driver::{TreeWalkDriver, WalkEnd};
pub use filter::{TimeFilter, TimeOp};

#[cfg(test)]
mod tests;
