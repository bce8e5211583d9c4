use thiserror::Error;

use skiff_revwalk::DagError;
use skiff_store::StoreError;
use skiff_types::ObjectId;

/// Failures while building, writing or indexing a pack.
#[derive(Debug, Error)]
pub enum PackError {
    #[error("not a skiff pack: header reads {actual}, want {expected}")]
    InvalidMagic { expected: String, actual: String },

    #[error("pack version {0} is not supported")]
    UnsupportedVersion(u32),

    #[error("pack trailer does not match its contents")]
    ChecksumMismatch,

    #[error("bad entry at pack offset {offset}: {reason}")]
    CorruptEntry { offset: u64, reason: String },

    #[error("entry {id} fails its crc check")]
    CrcMismatch { id: ObjectId },

    #[error("cannot inflate entry: {0}")]
    DecompressionFailed(String),

    #[error("cannot deflate entry: {0}")]
    CompressionFailed(String),

    #[error("worker pool: {0}")]
    ThreadPool(String),

    /// The progress callback asked to stop.
    #[error("pack building aborted: {0}")]
    Aborted(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("walking history: {0}")]
    Dag(#[from] DagError),
}

pub type PackResult<T> = Result<T, PackError>;
