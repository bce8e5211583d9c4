//! The local repository a push reads from and records tracking refs in.

use std::sync::Arc;

use skiff_refs::{InMemoryRefStore, RefError, RefStore};
use skiff_store::{InMemoryObjectStore, ObjectKind, ObjectStore};
use skiff_types::ObjectId;

use crate::error::{PushError, PushResult};

/// Prefixes tried, in order, when a revision names a ref by short name.
const DWIM_RULES: &[&str] = &["", "refs/", "refs/tags/", "refs/heads/", "refs/remotes/"];

/// An object store and a ref store that belong together.
#[derive(Clone)]
pub struct Repository {
    pub objects: Arc<dyn ObjectStore>,
    pub refs: Arc<dyn RefStore>,
}

impl Repository {
    pub fn new(objects: Arc<dyn ObjectStore>, refs: Arc<dyn RefStore>) -> Self {
        Self { objects, refs }
    }

    /// An empty repository held in memory.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryObjectStore::new()),
            Arc::new(InMemoryRefStore::new()),
        )
    }

    pub fn objects(&self) -> &dyn ObjectStore {
        self.objects.as_ref()
    }

    pub fn refs(&self) -> &dyn RefStore {
        self.refs.as_ref()
    }

    /// Resolve an exact reference name to the id it points at.
    pub fn reference_name_to_id(&self, name: &str) -> PushResult<ObjectId> {
        self.refs.name_to_id(name).map_err(|e| match e {
            RefError::NotFound { .. } => PushError::ReferenceNotFound {
                name: name.to_string(),
            },
            RefError::InvalidName { reason, .. } => PushError::InvalidReference {
                name: name.to_string(),
                reason,
            },
            other => PushError::Refs(other),
        })
    }

    /// Resolve a revision to an existing object.
    ///
    /// Understands full hex ids, full ref names, short ref names tried
    /// against [`DWIM_RULES`] plus `refs/remotes/<name>/HEAD`, and any
    /// number of `~<n>` / `^<n>` suffixes walking first or n-th parents.
    pub fn rev_parse_single(&self, spec: &str) -> PushResult<ObjectId> {
        let invalid = |reason: &str| PushError::InvalidReference {
            name: spec.to_string(),
            reason: reason.to_string(),
        };
        let (base, steps) = split_navigation(spec).ok_or_else(|| invalid("malformed revision"))?;
        if base.is_empty() {
            return Err(invalid("empty revision"));
        }

        let mut id = self.resolve_base(spec, base)?;
        for step in steps {
            id = self.navigate(spec, id, step)?;
        }
        Ok(id)
    }

    fn resolve_base(&self, spec: &str, base: &str) -> PushResult<ObjectId> {
        let not_found = || PushError::ReferenceNotFound {
            name: spec.to_string(),
        };

        if ObjectId::looks_like_hex(base) {
            let id = ObjectId::from_hex(base).map_err(|e| PushError::InvalidReference {
                name: spec.to_string(),
                reason: e.to_string(),
            })?;
            return if self.objects.exists(&id)? {
                Ok(id)
            } else {
                Err(not_found())
            };
        }

        let mut candidates: Vec<String> = DWIM_RULES
            .iter()
            .map(|prefix| format!("{prefix}{base}"))
            .collect();
        candidates.push(format!("refs/remotes/{base}/HEAD"));

        let mut any_valid = false;
        for candidate in &candidates {
            if skiff_refs::validate_reference_name(candidate).is_err() {
                continue;
            }
            any_valid = true;
            if self.refs.find(candidate)?.is_none() {
                continue;
            }
            let id = self.reference_name_to_id(candidate)?;
            return if self.objects.exists(&id)? {
                Ok(id)
            } else {
                Err(not_found())
            };
        }

        if any_valid {
            Err(not_found())
        } else {
            Err(PushError::InvalidReference {
                name: spec.to_string(),
                reason: format!("{base:?} is not a valid reference name"),
            })
        }
    }

    fn navigate(&self, spec: &str, id: ObjectId, step: Step) -> PushResult<ObjectId> {
        let not_found = || PushError::ReferenceNotFound {
            name: spec.to_string(),
        };
        let mut current = skiff_revwalk::peel_to_commit(self.objects(), &id).map_err(|_| {
            PushError::InvalidReference {
                name: spec.to_string(),
                reason: "parent navigation needs a commit".into(),
            }
        })?;
        match step {
            Step::Ancestor(n) => {
                for _ in 0..n {
                    let commit = self.objects.read_commit(&current)?;
                    current = *commit.parents.first().ok_or_else(not_found)?;
                }
                Ok(current)
            }
            Step::Parent(0) => Ok(current),
            Step::Parent(n) => {
                let commit = self.objects.read_commit(&current)?;
                commit.parents.get(n - 1).copied().ok_or_else(not_found)
            }
        }
    }

    /// Kind of an object, if present.
    pub fn object_kind(&self, id: &ObjectId) -> PushResult<Option<ObjectKind>> {
        Ok(self.objects.read_header(id)?.map(|(kind, _)| kind))
    }
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository").finish_non_exhaustive()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Step {
    /// `~n`: n-th first-parent ancestor.
    Ancestor(usize),
    /// `^n`: n-th parent; `^0` is the commit itself.
    Parent(usize),
}

/// Split `main~2^2` into `("main", [Ancestor(2), Parent(2)])`.
///
/// Returns `None` for a dangling or non-numeric suffix.
fn split_navigation(spec: &str) -> Option<(&str, Vec<Step>)> {
    let Some(start) = spec.find(['~', '^']) else {
        return Some((spec, Vec::new()));
    };
    let (base, mut rest) = spec.split_at(start);

    let mut steps = Vec::new();
    while let Some(op) = rest.chars().next() {
        rest = &rest[op.len_utf8()..];
        let digits = rest.chars().take_while(char::is_ascii_digit).count();
        let n = if digits == 0 {
            1
        } else {
            rest[..digits].parse().ok()?
        };
        rest = &rest[digits..];
        steps.push(match op {
            '~' => Step::Ancestor(n),
            '^' => Step::Parent(n),
            _ => return None,
        });
    }
    Some((base, steps))
}
