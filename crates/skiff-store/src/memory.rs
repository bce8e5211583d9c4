use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use skiff_types::ObjectId;

use crate::error::{StoreError, StoreResult};
use crate::object::{ObjectKind, StoredObject};
use crate::traits::ObjectStore;

/// Object store backed by a `HashMap` behind a `RwLock`.
///
/// Reads hand out clones.
#[derive(Default)]
pub struct InMemoryObjectStore {
    objects: RwLock<HashMap<ObjectId, StoredObject>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn map(&self) -> StoreResult<RwLockReadGuard<'_, HashMap<ObjectId, StoredObject>>> {
        self.objects
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }

    fn map_mut(&self) -> StoreResult<RwLockWriteGuard<'_, HashMap<ObjectId, StoredObject>>> {
        self.objects
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> usize {
        self.map().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return a sorted list of all object IDs in the store.
    pub fn all_ids(&self) -> StoreResult<Vec<ObjectId>> {
        let mut ids: Vec<ObjectId> = self.map()?.keys().copied().collect();
        ids.sort();
        Ok(ids)
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>> {
        Ok(self.map()?.get(id).cloned())
    }

    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId> {
        let id = object.compute_id();
        if id.is_null() {
            return Err(StoreError::NullObjectId);
        }
        self.map_mut()?.entry(id).or_insert_with(|| object.clone());
        Ok(id)
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        Ok(self.map()?.contains_key(id))
    }

    fn read_header(&self, id: &ObjectId) -> StoreResult<Option<(ObjectKind, u64)>> {
        Ok(self.map()?.get(id).map(|obj| (obj.kind, obj.size)))
    }
}

impl std::fmt::Debug for InMemoryObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryObjectStore")
            .field("object_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::*;
    use skiff_types::Signature;

    fn make_blob(content: &[u8]) -> StoredObject {
        Blob::new(content.to_vec()).to_stored_object()
    }

    #[test]
    fn write_and_read_blob() {
        let store = InMemoryObjectStore::new();
        let obj = make_blob(b"hello world");
        let id = store.write(&obj).unwrap();
        assert!(!id.is_null());
        assert_eq!(store.read(&id).unwrap(), Some(obj));
    }

    #[test]
    fn write_is_idempotent() {
        let store = InMemoryObjectStore::new();
        let obj = make_blob(b"same");
        let a = store.write(&obj).unwrap();
        let b = store.write(&obj).unwrap();
        assert_eq!(a, b);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn read_header_reports_kind_and_size() {
        let store = InMemoryObjectStore::new();
        let id = store.write(&make_blob(b"12345")).unwrap();
        assert_eq!(store.read_header(&id).unwrap(), Some((ObjectKind::Blob, 5)));
        assert_eq!(store.read_header(&ObjectId::from_bytes(b"nope")).unwrap(), None);
    }

    #[test]
    fn typed_reads_distinguish_missing_and_wrong_kind() {
        let store = InMemoryObjectStore::new();
        let blob = store.write(&make_blob(b"data")).unwrap();
        assert!(matches!(
            store.read_commit(&blob),
            Err(StoreError::KindMismatch { .. })
        ));
        let missing = ObjectId::from_bytes(b"missing");
        assert!(matches!(store.read_tag(&missing), Err(StoreError::NotFound(id)) if id == missing));
    }

    #[test]
    fn read_commit_roundtrip() {
        let store = InMemoryObjectStore::new();
        let tree = store.write(&Tree::empty().to_stored_object().unwrap()).unwrap();
        let commit = Commit {
            tree,
            parents: vec![],
            author: Signature::new("a", "a@x", 5),
            committer: Signature::new("a", "a@x", 5),
            message: "init".into(),
        };
        let id = store.write(&commit.to_stored_object().unwrap()).unwrap();
        assert_eq!(store.read_commit(&id).unwrap(), commit);
        assert_eq!(store.read_tree(&tree).unwrap(), Tree::empty());
    }

    #[test]
    fn null_id_is_never_present() {
        let store = InMemoryObjectStore::new();
        store.write(&make_blob(b"something")).unwrap();
        assert!(!store.exists(&ObjectId::null()).unwrap());
        assert!(matches!(
            store.find(&ObjectId::null()),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn all_ids_sorted() {
        let store = InMemoryObjectStore::new();
        for i in 0..5 {
            store.write(&make_blob(format!("blob-{i}").as_bytes())).unwrap();
        }
        let ids = store.all_ids().unwrap();
        assert_eq!(ids.len(), 5);
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }
}
