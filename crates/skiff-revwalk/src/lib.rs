//! Commit graph traversal for skiff.
//!
//! Commits live in an [`ObjectStore`](skiff_store::ObjectStore) and name
//! their parents, so the history forms a DAG that is walked lazily from
//! the store rather than held in memory.
//!
//! # Modules
//!
//! - [`walk`]: [`RevWalk`], enumerating commits reachable from some tips
//!   but not from others
//! - [`merge_base`]: best common ancestor and ancestry queries
//! - [`error`]: [`DagError`]

pub mod error;
pub mod merge_base;
pub mod walk;

#[cfg(test)]
pub(crate) mod fixtures;

pub use error::{DagError, DagResult};
pub use merge_base::{is_ancestor, merge_base};
pub use walk::{peel, peel_to_commit, RevWalk, Sorting, Walk};
