//! Pack encoding for skiff.
//!
//! Provides zstd-compressed, CRC-checked packs for moving a set of objects
//! between repositories in one stream.
//!
//! # Architecture
//!
//! - **Pack**: header, concatenated compressed objects, BLAKE3 trailer
//! - **Pack index**: fan-out table + sorted IDs for O(log n) lookups
//! - **PackBuilder**: decides which objects go in (walk finishing, tree
//!   closure) and drives the writer on a worker pool
//! - **PackWriter**: encodes queued objects into pack bytes
//! - **PackReader**: random-access reading, and indexing of packs that
//!   arrive without an index

pub mod builder;
pub mod entry;
pub mod error;
pub mod index;
pub mod reader;
pub mod writer;

pub use builder::{PackBuilder, PackProgress, PackStage, ProgressFn};
pub use error::{PackError, PackResult};
pub use index::PackIndex;
pub use reader::PackReader;
pub use writer::{PackWriter, PACK_MAGIC, PACK_VERSION};
