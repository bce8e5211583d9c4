//! Caller hooks invoked during a push.
//!
//! Each hook returns `Result<(), CallbackError>`; an `Err` stops the push
//! and surfaces as [`PushError::CallbackAborted`](crate::PushError::CallbackAborted).

use skiff_pack::PackProgress;
use skiff_types::ObjectId;

use crate::types::PushUpdate;

/// A callback's request to stop.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct CallbackError(pub String);

impl CallbackError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// Sees the full update list before any object is sent.
pub type NegotiationFn<'a> =
    Box<dyn FnMut(&[PushUpdate]) -> Result<(), CallbackError> + Send + 'a>;

/// Called per tracking ref moved: `(tracking_ref, old_id, new_id)`.
pub type UpdateTipsFn<'a> =
    Box<dyn FnMut(&str, &ObjectId, &ObjectId) -> Result<(), CallbackError> + Send + 'a>;

/// Pack encoder progress.
pub type PackProgressFn<'a> =
    Box<dyn FnMut(&PackProgress) -> Result<(), CallbackError> + Send + 'a>;

#[derive(Default)]
pub struct PushCallbacks<'a> {
    pub push_negotiation: Option<NegotiationFn<'a>>,
    pub update_tips: Option<UpdateTipsFn<'a>>,
    pub pack_progress: Option<PackProgressFn<'a>>,
}

impl<'a> PushCallbacks<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_push_negotiation(
        mut self,
        f: impl FnMut(&[PushUpdate]) -> Result<(), CallbackError> + Send + 'a,
    ) -> Self {
        self.push_negotiation = Some(Box::new(f));
        self
    }

    pub fn on_update_tips(
        mut self,
        f: impl FnMut(&str, &ObjectId, &ObjectId) -> Result<(), CallbackError> + Send + 'a,
    ) -> Self {
        self.update_tips = Some(Box::new(f));
        self
    }

    pub fn on_pack_progress(
        mut self,
        f: impl FnMut(&PackProgress) -> Result<(), CallbackError> + Send + 'a,
    ) -> Self {
        self.pack_progress = Some(Box::new(f));
        self
    }
}

impl std::fmt::Debug for PushCallbacks<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushCallbacks")
            .field("push_negotiation", &self.push_negotiation.is_some())
            .field("update_tips", &self.update_tips.is_some())
            .field("pack_progress", &self.pack_progress.is_some())
            .finish()
    }
}
