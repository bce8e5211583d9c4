use serde::{Deserialize, Serialize};

use skiff_refs::RefSpec;
use skiff_types::ObjectId;

/// One requested ref transition.
///
/// Built from refspec text by [`parse_push_refspec`](crate::validate::parse_push_refspec)
/// with both ids null; the ids are filled in once per push attempt by the
/// [`WorkResolver`](crate::work::WorkResolver).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpdateSpec {
    pub refspec: RefSpec,
    /// Local revision the new value is read from; empty for a deletion.
    pub src: String,
    /// Fully-qualified remote ref name.
    pub dst: String,
    pub force: bool,
    /// Null when this is a deletion.
    pub local_id: ObjectId,
    /// Null when the remote does not have `dst` yet.
    pub remote_id: ObjectId,
}

impl UpdateSpec {
    pub fn from_refspec(refspec: RefSpec) -> Self {
        Self {
            src: refspec.src.clone(),
            dst: refspec.dst.clone(),
            force: refspec.force,
            refspec,
            local_id: ObjectId::NULL,
            remote_id: ObjectId::NULL,
        }
    }

    pub fn is_delete(&self) -> bool {
        self.src.is_empty()
    }

    /// The remote already holds the value being pushed.
    pub fn is_up_to_date(&self) -> bool {
        self.local_id == self.remote_id
    }

    pub fn to_update(&self) -> PushUpdate {
        PushUpdate {
            src_refname: self.src.clone(),
            dst_refname: self.dst.clone(),
            old_id: self.remote_id,
            new_id: self.local_id,
        }
    }
}

/// Read-only view of an [`UpdateSpec`] handed to callbacks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushUpdate {
    pub src_refname: String,
    pub dst_refname: String,
    /// What the remote advertised for the destination.
    pub old_id: ObjectId,
    /// What the destination will point at; null for a deletion.
    pub new_id: ObjectId,
}

/// The remote's verdict on one ref.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushStatus {
    pub ref_name: String,
    /// `None` when the update was accepted.
    pub message: Option<String>,
}

impl PushStatus {
    pub fn accepted(ref_name: impl Into<String>) -> Self {
        Self {
            ref_name: ref_name.into(),
            message: None,
        }
    }

    pub fn rejected(ref_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            ref_name: ref_name.into(),
            message: Some(message.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.message.is_none()
    }
}

/// A ref advertised by the remote.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteHead {
    pub name: String,
    pub id: ObjectId,
}

impl RemoteHead {
    pub fn new(name: impl Into<String>, id: ObjectId) -> Self {
        Self {
            name: name.into(),
            id,
        }
    }
}
