use skiff_types::ObjectId;

use crate::error::{RefError, Result};
use crate::types::{Reference, ReflogEntry, Target};

/// Symbolic hops [`RefStore::resolve`] follows before reporting a loop.
pub const MAX_SYMBOLIC_DEPTH: usize = 5;

/// A repository's ref namespace.
///
/// Names are full (`refs/heads/main`, `HEAD`). Each create or delete is
/// atomic on its own; there are no multi-ref transactions.
pub trait RefStore: Send + Sync {
    /// The ref stored under `name`, not followed if symbolic.
    fn find(&self, name: &str) -> Result<Option<Reference>>;

    /// Point `name` at `id`, appending `log_message` to its reflog.
    ///
    /// Fails with [`RefError::AlreadyExists`] when the ref exists and
    /// `force` is false.
    fn create(
        &self,
        name: &str,
        id: ObjectId,
        force: bool,
        log_message: &str,
    ) -> Result<Reference>;

    fn create_symbolic(&self, name: &str, target: &str, force: bool) -> Result<Reference>;

    /// Remove `name`. `Ok(false)` means there was nothing to remove.
    fn delete(&self, name: &str) -> Result<bool>;

    /// Refs under `prefix` in name order. `""` lists all of them.
    fn list(&self, prefix: &str) -> Result<Vec<Reference>>;

    /// Moves of `name`, oldest first.
    fn reflog(&self, name: &str) -> Result<Vec<ReflogEntry>>;

    fn get(&self, name: &str) -> Result<Reference> {
        self.find(name)?.ok_or_else(|| RefError::NotFound {
            name: name.to_owned(),
        })
    }

    /// The direct ref reached by following `name` through symbolic refs.
    fn resolve(&self, name: &str) -> Result<Reference> {
        let mut current = self.get(name)?;
        for hops in 0.. {
            let next = match &current.target {
                Target::Direct(_) => return Ok(current),
                Target::Symbolic(_) if hops == MAX_SYMBOLIC_DEPTH => break,
                Target::Symbolic(next) => next.clone(),
            };
            current = self.get(&next)?;
        }
        Err(RefError::SymbolicLoop {
            name: name.to_owned(),
        })
    }

    fn name_to_id(&self, name: &str) -> Result<ObjectId> {
        self.resolve(name)?.id().ok_or_else(|| RefError::SymbolicLoop {
            name: name.to_owned(),
        })
    }
}
