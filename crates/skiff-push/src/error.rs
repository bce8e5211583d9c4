use thiserror::Error;

use skiff_pack::PackError;
use skiff_refs::RefError;
use skiff_revwalk::DagError;
use skiff_store::StoreError;

/// Why an update was refused as a non-fast-forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NonFastForwardReason {
    /// The remote tip is not in the local object store, so the remote has
    /// history this side cannot check against.
    RemoteObjectMissing,
    /// The remote tip is not an ancestor of the new local tip.
    NotAnAncestor,
}

impl std::fmt::Display for NonFastForwardReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RemoteObjectMissing => write!(
                f,
                "the remote ref contains commits that are not present locally"
            ),
            Self::NotAnAncestor => write!(f, "the remote tip is not an ancestor of the new tip"),
        }
    }
}

/// Errors raised by a transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The transport cannot perform the named operation.
    #[error("transport does not support {0}")]
    Unsupported(&'static str),

    #[error("transport is not connected")]
    NotConnected,

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    /// Encoding the outgoing pack failed.
    #[error("pack error: {0}")]
    Pack(#[from] PackError),
}

pub type TransportResult<T> = Result<T, TransportError>;

/// Coarse error categories callers can branch on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidReference,
    ReferenceNotFound,
    NonFastForward,
    TransportUnsupported,
    TransportFailure,
    UnpackFailed,
    CallbackAborted,
    InvalidOptions,
    InvalidState,
    Storage,
}

#[derive(Debug, Error)]
pub enum PushError {
    /// Malformed refspec text, a destination outside `refs/`, or a source
    /// that is not a well-formed revision.
    #[error("invalid reference {name:?}: {reason}")]
    InvalidReference { name: String, reason: String },

    #[error("reference not found: {name}")]
    ReferenceNotFound { name: String },

    #[error("cannot push non-fast-forwardable reference {reference}: {reason}")]
    NonFastForward {
        reference: String,
        reason: NonFastForwardReason,
    },

    #[error("remote transport doesn't support push")]
    TransportUnsupported,

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("unpacking the sent packfile failed on the remote")]
    UnpackFailed,

    /// A caller callback asked to stop.
    #[error("{callback} callback aborted: {reason}")]
    CallbackAborted {
        callback: &'static str,
        reason: String,
    },

    #[error("invalid push options: {0}")]
    InvalidOptions(String),

    /// The session is not in a state that allows the operation.
    #[error("invalid push state: {0}")]
    InvalidState(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("ref error: {0}")]
    Refs(#[from] RefError),

    #[error("history walk failed: {0}")]
    Dag(#[from] DagError),

    #[error("pack error: {0}")]
    Pack(#[from] PackError),
}

impl PushError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidReference { .. } => ErrorKind::InvalidReference,
            Self::ReferenceNotFound { .. } => ErrorKind::ReferenceNotFound,
            Self::NonFastForward { .. } => ErrorKind::NonFastForward,
            Self::TransportUnsupported | Self::Transport(TransportError::Unsupported(_)) => {
                ErrorKind::TransportUnsupported
            }
            Self::Transport(_) => ErrorKind::TransportFailure,
            Self::UnpackFailed => ErrorKind::UnpackFailed,
            Self::CallbackAborted { .. } => ErrorKind::CallbackAborted,
            Self::InvalidOptions(_) => ErrorKind::InvalidOptions,
            Self::InvalidState(_) => ErrorKind::InvalidState,
            Self::Store(_) | Self::Refs(_) | Self::Dag(_) | Self::Pack(_) => ErrorKind::Storage,
        }
    }

    /// Lift pack and transport errors that originate in the progress
    /// callback to [`PushError::CallbackAborted`].
    pub(crate) fn from_pack(err: PackError) -> Self {
        match err {
            PackError::Aborted(reason) => Self::CallbackAborted {
                callback: "pack_progress",
                reason,
            },
            other => Self::Pack(other),
        }
    }

    pub(crate) fn from_transport(err: TransportError) -> Self {
        match err {
            TransportError::Pack(pack) => match Self::from_pack(pack) {
                Self::Pack(other) => Self::Transport(TransportError::Pack(other)),
                lifted => lifted,
            },
            TransportError::Unsupported("push") => Self::TransportUnsupported,
            other => Self::Transport(other),
        }
    }
}

pub type PushResult<T> = Result<T, PushError>;
