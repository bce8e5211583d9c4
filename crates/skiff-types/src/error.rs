use thiserror::Error;

/// Failure to build an [`ObjectId`](crate::ObjectId) from external input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    /// The text was not valid hexadecimal.
    #[error("object id is not hex: {0}")]
    InvalidHex(String),

    /// The decoded id had the wrong number of bytes.
    #[error("object id must be {expected} bytes, found {actual}")]
    InvalidLength { expected: usize, actual: usize },
}
