//! Error types for commit graph traversal.

use skiff_store::{ObjectKind, StoreError};
use skiff_types::ObjectId;

/// Errors that can occur while walking history.
#[derive(Debug, thiserror::Error)]
pub enum DagError {
    /// A tip does not exist in the object store.
    #[error("object not found: {0}")]
    NotFound(ObjectId),

    /// A tip peels to something other than a commit.
    #[error("object {id} is a {kind}, not a commit")]
    NotACommit { id: ObjectId, kind: ObjectKind },

    /// A commit that must be walked names a parent that is not stored.
    #[error("commit {commit} references missing parent {parent}")]
    MissingParent {
        /// The commit containing the bad reference.
        commit: ObjectId,
        /// The missing parent.
        parent: ObjectId,
    },

    /// The underlying store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Convenience alias for DAG results.
pub type DagResult<T> = Result<T, DagError>;
