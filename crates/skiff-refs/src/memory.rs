//! In-memory reference store for testing and ephemeral use.
//!
//! [`InMemoryRefStore`] keeps refs in a `BTreeMap` protected by a
//! `RwLock`, so listings come out sorted for free. Reflogs live next to
//! the refs and are dropped with them.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use skiff_types::ObjectId;

use crate::error::{RefError, Result};
use crate::names::validate_reference_name;
use crate::traits::RefStore;
use crate::types::{Reference, ReflogEntry};

#[derive(Debug, Default)]
struct Inner {
    refs: BTreeMap<String, Reference>,
    reflogs: BTreeMap<String, Vec<ReflogEntry>>,
}

/// An in-memory implementation of [`RefStore`].
#[derive(Debug, Default)]
pub struct InMemoryRefStore {
    inner: RwLock<Inner>,
}

impl InMemoryRefStore {
    /// Create a new empty ref store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|e| RefError::LockPoisoned(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|e| RefError::LockPoisoned(e.to_string()))
    }
}

impl RefStore for InMemoryRefStore {
    fn find(&self, name: &str) -> Result<Option<Reference>> {
        Ok(self.read()?.refs.get(name).cloned())
    }

    fn create(
        &self,
        name: &str,
        id: ObjectId,
        force: bool,
        log_message: &str,
    ) -> Result<Reference> {
        validate_reference_name(name)?;
        let mut inner = self.write()?;
        let old = match inner.refs.get(name) {
            Some(_) if !force => {
                return Err(RefError::AlreadyExists {
                    name: name.to_string(),
                })
            }
            Some(existing) => existing.id().unwrap_or(ObjectId::NULL),
            None => ObjectId::NULL,
        };

        let reference = Reference::direct(name, id);
        inner.refs.insert(name.to_string(), reference.clone());
        inner
            .reflogs
            .entry(name.to_string())
            .or_default()
            .push(ReflogEntry {
                old,
                new: id,
                message: log_message.to_string(),
            });
        debug!(name, old = %old.short_hex(), new = %id.short_hex(), "ref updated");
        Ok(reference)
    }

    fn create_symbolic(&self, name: &str, target: &str, force: bool) -> Result<Reference> {
        validate_reference_name(name)?;
        validate_reference_name(target)?;
        let mut inner = self.write()?;
        if !force && inner.refs.contains_key(name) {
            return Err(RefError::AlreadyExists {
                name: name.to_string(),
            });
        }
        let reference = Reference::symbolic(name, target);
        inner.refs.insert(name.to_string(), reference.clone());
        Ok(reference)
    }

    fn delete(&self, name: &str) -> Result<bool> {
        let mut inner = self.write()?;
        inner.reflogs.remove(name);
        let existed = inner.refs.remove(name).is_some();
        if existed {
            debug!(name, "ref deleted");
        }
        Ok(existed)
    }

    fn list(&self, prefix: &str) -> Result<Vec<Reference>> {
        Ok(self
            .read()?
            .refs
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(_, v)| v.clone())
            .collect())
    }

    fn reflog(&self, name: &str) -> Result<Vec<ReflogEntry>> {
        Ok(self.read()?.reflogs.get(name).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Target;

    fn id(seed: &str) -> ObjectId {
        ObjectId::from_bytes(seed.as_bytes())
    }

    #[test]
    fn create_and_find() {
        let store = InMemoryRefStore::new();
        store.create("refs/heads/main", id("a"), false, "init").unwrap();

        let found = store.find("refs/heads/main").unwrap().unwrap();
        assert_eq!(found.id(), Some(id("a")));
        assert!(store.find("refs/heads/other").unwrap().is_none());
    }

    #[test]
    fn create_without_force_rejects_existing() {
        let store = InMemoryRefStore::new();
        store.create("refs/heads/main", id("a"), false, "init").unwrap();
        let err = store
            .create("refs/heads/main", id("b"), false, "again")
            .unwrap_err();
        assert!(matches!(err, RefError::AlreadyExists { .. }));

        store.create("refs/heads/main", id("b"), true, "forced").unwrap();
        assert_eq!(store.name_to_id("refs/heads/main").unwrap(), id("b"));
    }

    #[test]
    fn create_rejects_invalid_name() {
        let store = InMemoryRefStore::new();
        assert!(store.create("main", id("a"), true, "x").is_err());
        assert!(store.create("refs/heads/a..b", id("a"), true, "x").is_err());
    }

    #[test]
    fn reflog_records_moves() {
        let store = InMemoryRefStore::new();
        store.create("refs/heads/main", id("a"), true, "first").unwrap();
        store.create("refs/heads/main", id("b"), true, "second").unwrap();

        let log = store.reflog("refs/heads/main").unwrap();
        assert_eq!(log.len(), 2);
        assert!(log[0].old.is_null());
        assert_eq!(log[1].old, id("a"));
        assert_eq!(log[1].new, id("b"));
        assert_eq!(log[1].message, "second");
    }

    #[test]
    fn delete_existing_and_missing() {
        let store = InMemoryRefStore::new();
        store.create("refs/heads/main", id("a"), true, "x").unwrap();
        assert!(store.delete("refs/heads/main").unwrap());
        assert!(!store.delete("refs/heads/main").unwrap());
        assert!(store.reflog("refs/heads/main").unwrap().is_empty());
    }

    #[test]
    fn list_by_prefix_is_sorted() {
        let store = InMemoryRefStore::new();
        store.create("refs/heads/zeta", id("z"), true, "x").unwrap();
        store.create("refs/heads/alpha", id("a"), true, "x").unwrap();
        store.create("refs/tags/v1", id("t"), true, "x").unwrap();

        let heads: Vec<String> = store
            .list("refs/heads/")
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(heads, vec!["refs/heads/alpha", "refs/heads/zeta"]);
        assert_eq!(store.list("").unwrap().len(), 3);
    }

    #[test]
    fn symbolic_refs_resolve() {
        let store = InMemoryRefStore::new();
        store.create("refs/heads/main", id("a"), true, "x").unwrap();
        store.create_symbolic("HEAD", "refs/heads/main", true).unwrap();

        let head = store.find("HEAD").unwrap().unwrap();
        assert!(matches!(head.target, Target::Symbolic(_)));
        assert_eq!(store.name_to_id("HEAD").unwrap(), id("a"));
    }

    #[test]
    fn symbolic_cycle_is_an_error() {
        let store = InMemoryRefStore::new();
        store.create_symbolic("refs/heads/a", "refs/heads/b", true).unwrap();
        store.create_symbolic("refs/heads/b", "refs/heads/a", true).unwrap();
        let err = store.resolve("refs/heads/a").unwrap_err();
        assert!(matches!(err, RefError::SymbolicLoop { .. }));
    }
}
