//! Commit graphs for tests.

use skiff_store::{
    Blob, Commit, EntryMode, InMemoryObjectStore, ObjectKind, ObjectStore, Tag, Tree, TreeEntry,
};
use skiff_types::{ObjectId, Signature};

/// Builds commits with distinct trees and increasing timestamps.
pub struct Graph {
    pub store: InMemoryObjectStore,
    clock: i64,
}

impl Graph {
    pub fn new() -> Self {
        Self {
            store: InMemoryObjectStore::new(),
            clock: 1_000,
        }
    }

    pub fn commit(&mut self, message: &str, parents: &[ObjectId]) -> ObjectId {
        self.clock += 10;
        self.commit_at(message, parents, self.clock)
    }

    pub fn commit_at(&mut self, message: &str, parents: &[ObjectId], time: i64) -> ObjectId {
        let blob = self
            .store
            .write(&Blob::new(message.as_bytes().to_vec()).to_stored_object())
            .unwrap();
        let tree = Tree::new(vec![TreeEntry::new(EntryMode::Regular, "file", blob)]);
        let tree = self.store.write(&tree.to_stored_object().unwrap()).unwrap();
        let sig = Signature::new("Test", "test@example.com", time);
        let commit = Commit {
            tree,
            parents: parents.to_vec(),
            author: sig.clone(),
            committer: sig,
            message: message.to_string(),
        };
        self.store.write(&commit.to_stored_object().unwrap()).unwrap()
    }

    pub fn tag(&mut self, name: &str, target: ObjectId, target_kind: ObjectKind) -> ObjectId {
        let tag = Tag {
            target,
            target_kind,
            name: name.to_string(),
            tagger: None,
            message: name.to_string(),
        };
        self.store.write(&tag.to_stored_object().unwrap()).unwrap()
    }

    pub fn blob(&mut self, data: &[u8]) -> ObjectId {
        self.store
            .write(&Blob::new(data.to_vec()).to_stored_object())
            .unwrap()
    }
}
