//! Identifiers shared by every skiff crate.
//!
//! - [`ObjectId`]: a 32-byte BLAKE3 object name. [`ObjectId::NULL`] stands
//!   for "no object" in ref updates.
//! - [`Signature`]: who made a commit or tag, and when.

pub mod error;
pub mod object;
pub mod signature;

pub use error::TypeError;
pub use object::ObjectId;
pub use signature::Signature;
