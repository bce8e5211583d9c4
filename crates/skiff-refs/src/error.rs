use thiserror::Error;

#[derive(Debug, Error)]
pub enum RefError {
    #[error("no ref named {name}")]
    NotFound { name: String },

    /// Creation without `force` over an existing ref.
    #[error("{name} already exists")]
    AlreadyExists { name: String },

    #[error("{name:?} is not a valid ref name: {reason}")]
    InvalidName { name: String, reason: String },

    #[error("cannot parse refspec {spec:?}: {reason}")]
    InvalidRefspec { spec: String, reason: String },

    /// Symbolic refs from `name` did not reach a direct ref in time.
    #[error("symbolic refs starting at {name} form a loop")]
    SymbolicLoop { name: String },

    #[error("ref store lock poisoned: {0}")]
    LockPoisoned(String),
}

pub type Result<T> = std::result::Result<T, RefError>;
