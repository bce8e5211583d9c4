use skiff_types::ObjectId;

use crate::error::{StoreError, StoreResult};
use crate::object::{Commit, ObjectKind, StoredObject, Tag, Tree};

/// Access to an object database.
///
/// Lookups report absence as `Ok(None)` or `Ok(false)`; `Err` means the
/// backend itself failed or held damaged data. Writing the same object twice
/// yields the same id and stores it once.
pub trait ObjectStore: Send + Sync {
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>>;

    /// Store `object`, returning its id.
    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId>;

    fn exists(&self, id: &ObjectId) -> StoreResult<bool>;

    /// Kind and body length of `id`, without handing back the body.
    ///
    /// Backends that keep headers apart from bodies should override this.
    fn read_header(&self, id: &ObjectId) -> StoreResult<Option<(ObjectKind, u64)>> {
        Ok(self.read(id)?.map(|obj| (obj.kind, obj.size)))
    }

    /// Like [`read`](Self::read), but absence is [`StoreError::NotFound`].
    fn find(&self, id: &ObjectId) -> StoreResult<StoredObject> {
        self.read(id)?.ok_or(StoreError::NotFound(*id))
    }

    fn read_commit(&self, id: &ObjectId) -> StoreResult<Commit> {
        Commit::from_stored_object(&self.find(id)?)
    }

    fn read_tag(&self, id: &ObjectId) -> StoreResult<Tag> {
        Tag::from_stored_object(&self.find(id)?)
    }

    fn read_tree(&self, id: &ObjectId) -> StoreResult<Tree> {
        Tree::from_stored_object(&self.find(id)?)
    }
}
