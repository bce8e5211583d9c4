//! Push synchronization for skiff.
//!
//! Takes a set of refspecs and makes a remote repository match them:
//! each refspec is resolved to concrete object ids, checked against the
//! fast-forward policy, turned into the minimal set of objects the remote
//! is missing, and handed to a [`Transport`]. Once the remote reports
//! back, the local tracking refs are moved for every ref it accepted.
//!
//! # Usage
//!
//! ```ignore
//! let mut push = Push::new(&repo, &mut remote);
//! push.add_refspec("refs/heads/main:refs/heads/main")?;
//! push.finish(&mut PushCallbacks::new()).await?;
//! push.status_foreach(|name, message| {
//!     println!("{name}: {}", message.unwrap_or("ok"));
//!     Ok(())
//! })?;
//! ```
//!
//! # Modules
//!
//! - [`push`]: [`Push`], the session driving one attempt
//! - [`validate`]: refspec text to [`UpdateSpec`]
//! - [`work`]: filling in local and remote ids
//! - [`fast_forward`]: non-fast-forward detection
//! - [`enumerate`]: the outgoing object set
//! - [`tips`]: tracking ref reconciliation
//! - [`transport`]: the [`Transport`] trait
//! - [`local`]: [`LocalTransport`], an in-process remote
//! - [`remote`]: [`Remote`], its name, fetch refspecs and transport
//! - [`repository`]: [`Repository`], the local object and ref stores
//! - [`options`]: [`PushOptions`]
//! - [`callbacks`]: [`PushCallbacks`]
//! - [`error`]: [`PushError`] and [`TransportError`]

pub mod callbacks;
pub mod enumerate;
pub mod error;
pub mod fast_forward;
pub mod local;
pub mod options;
pub mod push;
pub mod remote;
pub mod repository;
pub mod tips;
pub mod transport;
pub mod types;
pub mod validate;
pub mod work;

#[cfg(test)]
pub(crate) mod testing;

pub use callbacks::{CallbackError, PushCallbacks};
pub use enumerate::{Enumeration, ObjectSetEnumerator};
pub use error::{
    ErrorKind, NonFastForwardReason, PushError, PushResult, TransportError, TransportResult,
};
pub use fast_forward::FastForwardValidator;
pub use local::{LocalTransport, ReceiveConfig};
pub use options::{PushOptions, PUSH_OPTIONS_VERSION};
pub use push::{Push, PushState};
pub use remote::Remote;
pub use repository::Repository;
pub use tips::TipsReconciler;
pub use transport::{PushReport, PushRequest, Transport};
pub use types::{PushStatus, PushUpdate, RemoteHead, UpdateSpec};
pub use validate::parse_push_refspec;
pub use work::WorkResolver;
