//! Core reference types.

use serde::{Deserialize, Serialize};
use skiff_types::ObjectId;

/// What a reference points at.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Target {
    /// An object id.
    Direct(ObjectId),
    /// The full name of another reference.
    Symbolic(String),
}

/// A named reference.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    /// Full name, e.g. `refs/heads/main`.
    pub name: String,
    pub target: Target,
}

impl Reference {
    pub fn direct(name: impl Into<String>, id: ObjectId) -> Self {
        Self {
            name: name.into(),
            target: Target::Direct(id),
        }
    }

    pub fn symbolic(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: Target::Symbolic(target.into()),
        }
    }

    /// The object id for direct refs, `None` for symbolic ones.
    pub fn id(&self) -> Option<ObjectId> {
        match &self.target {
            Target::Direct(id) => Some(*id),
            Target::Symbolic(_) => None,
        }
    }

    pub fn is_symbolic(&self) -> bool {
        matches!(self.target, Target::Symbolic(_))
    }

    /// The name without its `refs/<category>/` prefix.
    pub fn short_name(&self) -> &str {
        for prefix in ["refs/heads/", "refs/tags/", "refs/remotes/", "refs/"] {
            if let Some(rest) = self.name.strip_prefix(prefix) {
                return rest;
            }
        }
        &self.name
    }
}

/// One recorded movement of a reference.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReflogEntry {
    /// Previous value; null when the ref was created.
    pub old: ObjectId,
    pub new: ObjectId,
    pub message: String,
}
