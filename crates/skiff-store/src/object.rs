use std::cmp::Ordering;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use skiff_types::{ObjectId, Signature};

use crate::error::{StoreError, StoreResult};
use crate::hasher::ContentHasher;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    Blob,
    Tree,
    Commit,
    Tag,
}

impl ObjectKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Blob => "blob",
            Self::Tree => "tree",
            Self::Commit => "commit",
            Self::Tag => "tag",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An encoded object as the store holds it.
///
/// `size` is the body length, which is what [`ObjectStore::read_header`]
/// reports.
///
/// [`ObjectStore::read_header`]: crate::ObjectStore::read_header
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredObject {
    pub kind: ObjectKind,
    pub data: Vec<u8>,
    pub size: u64,
}

impl StoredObject {
    pub fn new(kind: ObjectKind, data: Vec<u8>) -> Self {
        Self {
            kind,
            size: data.len() as u64,
            data,
        }
    }

    pub fn compute_id(&self) -> ObjectId {
        ContentHasher::for_kind(self.kind).hash(&self.data)
    }

    fn expect_kind(&self, expected: ObjectKind) -> StoreResult<()> {
        if self.kind == expected {
            Ok(())
        } else {
            Err(StoreError::KindMismatch {
                id: self.compute_id(),
                expected,
                actual: self.kind,
            })
        }
    }

    fn decode<T: DeserializeOwned>(&self, expected: ObjectKind) -> StoreResult<T> {
        self.expect_kind(expected)?;
        serde_json::from_slice(&self.data).map_err(|e| StoreError::CorruptObject {
            id: self.compute_id(),
            reason: e.to_string(),
        })
    }
}

fn encode<T: Serialize>(kind: ObjectKind, value: &T) -> StoreResult<StoredObject> {
    serde_json::to_vec(value)
        .map(|data| StoredObject::new(kind, data))
        .map_err(|e| StoreError::Serialization(e.to_string()))
}

/// Opaque file content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Blob {
    pub data: Vec<u8>,
}

impl Blob {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn to_stored_object(&self) -> StoredObject {
        StoredObject::new(ObjectKind::Blob, self.data.clone())
    }

    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        obj.expect_kind(ObjectKind::Blob)?;
        Ok(Self::new(obj.data.clone()))
    }
}

/// What a tree entry points at, with git's numeric modes.
///
/// `Commit` entries are submodule links. Their target belongs to another
/// repository, so walks never descend into them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryMode {
    Regular,
    Executable,
    Symlink,
    Directory,
    Commit,
}

const MODE_BITS: [(EntryMode, u32); 5] = [
    (EntryMode::Regular, 0o100644),
    (EntryMode::Executable, 0o100755),
    (EntryMode::Symlink, 0o120000),
    (EntryMode::Directory, 0o040000),
    (EntryMode::Commit, 0o160000),
];

impl EntryMode {
    pub fn mode_bits(self) -> u32 {
        MODE_BITS
            .iter()
            .find_map(|&(mode, bits)| (mode == self).then_some(bits))
            .unwrap_or_default()
    }

    pub fn from_mode_bits(bits: u32) -> Option<Self> {
        MODE_BITS
            .iter()
            .find_map(|&(mode, b)| (b == bits).then_some(mode))
    }
}

impl fmt::Display for EntryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:06o}", self.mode_bits())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    pub mode: EntryMode,
    pub name: String,
    pub object_id: ObjectId,
}

impl TreeEntry {
    pub fn new(mode: EntryMode, name: impl Into<String>, object_id: ObjectId) -> Self {
        let name = name.into();
        Self {
            mode,
            name,
            object_id,
        }
    }
}

// Entries order by name alone; a tree never holds two entries with one name.
impl Ord for TreeEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name)
    }
}

impl PartialOrd for TreeEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A directory: entries kept sorted so equal listings hash equally.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tree {
    pub entries: Vec<TreeEntry>,
}

impl Tree {
    pub fn new(mut entries: Vec<TreeEntry>) -> Self {
        entries.sort();
        Self { entries }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&TreeEntry> {
        self.entries
            .binary_search_by(|e| e.name.as_str().cmp(name))
            .ok()
            .map(|i| &self.entries[i])
    }

    pub fn to_stored_object(&self) -> StoreResult<StoredObject> {
        encode(ObjectKind::Tree, self)
    }

    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        obj.decode(ObjectKind::Tree)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub tree: ObjectId,
    pub parents: Vec<ObjectId>,
    pub author: Signature,
    pub committer: Signature,
    pub message: String,
}

impl Commit {
    /// The committer timestamp. Revision walks order by this.
    pub fn time(&self) -> i64 {
        self.committer.time
    }

    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    pub fn to_stored_object(&self) -> StoreResult<StoredObject> {
        encode(ObjectKind::Commit, self)
    }

    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        obj.decode(ObjectKind::Commit)
    }
}

/// An annotated tag.
///
/// `target` may name another tag. Peeling follows the chain one object at a
/// time until `target_kind` is something other than [`ObjectKind::Tag`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub target: ObjectId,
    pub target_kind: ObjectKind,
    pub name: String,
    pub tagger: Option<Signature>,
    pub message: String,
}

impl Tag {
    pub fn to_stored_object(&self) -> StoreResult<StoredObject> {
        encode(ObjectKind::Tag, self)
    }

    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        obj.decode(ObjectKind::Tag)
    }
}
