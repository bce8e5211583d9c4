//! Named refs, their reflogs, and refspecs.
//!
//! A ref is either direct (an [`ObjectId`](skiff_types::ObjectId)) or
//! symbolic (the name of another ref, as `HEAD` usually is). Refs under
//! `refs/remotes/<remote>/` record what a remote was last seen holding;
//! push moves them once the remote accepts an update.
//!
//! [`RefSpec`] maps names between two namespaces, in either direction, with
//! at most one `*` on each side.
//!
//! [`InMemoryRefStore`] is the only [`RefStore`] backend.

pub mod error;
pub mod memory;
pub mod names;
pub mod refspec;
pub mod traits;
pub mod types;

pub use error::{RefError, Result};
pub use memory::InMemoryRefStore;
pub use names::{validate_reference_name, validate_remote_name, REFS_PREFIX};
pub use refspec::{Direction, RefSpec};
pub use traits::RefStore;
pub use types::{Reference, ReflogEntry, Target};
