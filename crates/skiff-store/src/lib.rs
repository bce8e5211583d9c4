//! The object database behind a skiff repository.
//!
//! Objects are immutable and named by their [`ObjectId`](skiff_types::ObjectId),
//! a BLAKE3 digest over the kind tag and the encoded body. Four kinds exist,
//! mirroring git:
//!
//! - [`Blob`]: opaque bytes
//! - [`Tree`]: named entries pointing at blobs and subtrees
//! - [`Commit`]: a tree, its parents, and authorship
//! - [`Tag`]: an annotated pointer at any object, tags included
//!
//! [`ObjectStore`] is the access trait. [`ObjectStore::read_header`] reports
//! an object's kind without decoding it, which is what push planning uses to
//! decide how to treat each source. [`InMemoryObjectStore`] is the only
//! backend; both sides of an in-process push use one.
//!
//! The null id is reserved and is never stored.

pub mod error;
pub mod hasher;
pub mod memory;
pub mod object;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use hasher::ContentHasher;
pub use memory::InMemoryObjectStore;
pub use object::{Blob, Commit, EntryMode, ObjectKind, StoredObject, Tag, Tree, TreeEntry};
pub use traits::ObjectStore;
