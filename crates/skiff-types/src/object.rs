use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

pub const OBJECT_ID_LEN: usize = 32;

/// Names an object by the digest of its kind and body.
///
/// The all-zero value is never a real object. Ref updates use it for "no
/// object": the old value of a ref being created, or the new value of one
/// being deleted.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId([u8; OBJECT_ID_LEN]);

impl ObjectId {
    pub const NULL: Self = Self([0; OBJECT_ID_LEN]);

    /// Plain BLAKE3 of `data`, with no kind tag.
    ///
    /// Stored objects get their ids from the store's hasher; this is for test
    /// fixtures and ids that only need to be distinct.
    pub fn from_bytes(data: &[u8]) -> Self {
        Self(blake3::hash(data).into())
    }

    pub const fn from_hash(hash: [u8; OBJECT_ID_LEN]) -> Self {
        Self(hash)
    }

    pub const fn null() -> Self {
        Self::NULL
    }

    pub fn is_null(&self) -> bool {
        *self == Self::NULL
    }

    pub fn as_bytes(&self) -> &[u8; OBJECT_ID_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First four bytes in hex. Used in log fields.
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Whether `s` is exactly a full-length hex id, so revision parsing can
    /// tell ids apart from ref names.
    pub fn looks_like_hex(s: &str) -> bool {
        s.len() == 2 * OBJECT_ID_LEN && s.bytes().all(|b| b.is_ascii_hexdigit())
    }

    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        let actual = bytes.len();
        <[u8; OBJECT_ID_LEN]>::try_from(bytes)
            .map(Self)
            .map_err(|_| TypeError::InvalidLength {
                expected: OBJECT_ID_LEN,
                actual,
            })
    }
}

impl FromStr for ObjectId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ObjectId").field(&self.short_hex()).finish()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
