use skiff_types::ObjectId;

use crate::object::ObjectKind;

/// Failures reading from or writing to an [`ObjectStore`](crate::ObjectStore).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No object with this id is stored.
    #[error("no such object {0}")]
    NotFound(ObjectId),

    /// The object was found but has a different kind than requested.
    #[error("object {id} is a {actual}, expected a {expected}")]
    KindMismatch {
        id: ObjectId,
        expected: ObjectKind,
        actual: ObjectKind,
    },

    /// An object body could not be encoded or decoded.
    #[error("cannot encode object: {0}")]
    Serialization(String),

    #[error("store io: {0}")]
    Io(#[from] std::io::Error),

    /// Stored bytes do not decode as the kind recorded in the header.
    #[error("object {id} is damaged: {reason}")]
    CorruptObject { id: ObjectId, reason: String },

    /// The null id is reserved and never names a stored object.
    #[error("the null object id cannot be stored")]
    NullObjectId,

    #[error("store lock poisoned: {0}")]
    LockPoisoned(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
