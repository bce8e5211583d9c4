//! One push attempt, from refspecs to tracking refs.
//!
//! A [`Push`] collects refspecs while [`PushState::Idle`], then
//! [`Push::finish`] drives the attempt through its states in order:
//!
//! ```text
//! Idle -> Connected -> WorkResolved -> Negotiated -> Enumerated
//!      -> Transmitted -> Reconciled
//! ```
//!
//! Any error moves the session to [`PushState::Failed`] and is returned.
//! Per-ref rejections by the remote are not errors; they are visible
//! through [`Push::statuses`] and [`Push::status_foreach`].

use tracing::{debug, warn};

use skiff_pack::PackBuilder;
use skiff_refs::Direction;

use crate::callbacks::{CallbackError, PushCallbacks};
use crate::enumerate::ObjectSetEnumerator;
use crate::error::{PushError, PushResult};
use crate::options::PushOptions;
use crate::remote::Remote;
use crate::repository::Repository;
use crate::tips::TipsReconciler;
use crate::transport::PushRequest;
use crate::types::{PushStatus, PushUpdate, UpdateSpec};
use crate::validate::parse_push_refspec;
use crate::work::WorkResolver;

/// Where a push attempt is.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PushState {
    Idle,
    Connected,
    WorkResolved,
    Negotiated,
    Enumerated,
    Transmitted,
    Reconciled,
    /// Terminal; holds the error message.
    Failed(String),
}

/// A push session against one remote.
pub struct Push<'r> {
    repo: &'r Repository,
    remote: &'r mut Remote,
    /// Sorted and unique by destination.
    specs: Vec<UpdateSpec>,
    updates: Vec<PushUpdate>,
    /// Sorted by ref name.
    statuses: Vec<PushStatus>,
    options: PushOptions,
    state: PushState,
    unpack_ok: bool,
}

impl<'r> Push<'r> {
    pub fn new(repo: &'r Repository, remote: &'r mut Remote) -> Self {
        Self {
            repo,
            remote,
            specs: Vec::new(),
            updates: Vec::new(),
            statuses: Vec::new(),
            options: PushOptions::default(),
            state: PushState::Idle,
            unpack_ok: false,
        }
    }

    pub fn set_options(&mut self, options: &PushOptions) -> PushResult<()> {
        options.validate()?;
        self.options = options.clone();
        Ok(())
    }

    pub fn options(&self) -> &PushOptions {
        &self.options
    }

    /// Parse `text` and add it to the session.
    ///
    /// A refspec whose destination is already taken is refused; the one
    /// added first stays. A failed add leaves the session as it was.
    pub fn add_refspec(&mut self, text: &str) -> PushResult<()> {
        self.require_idle("add a refspec")?;
        let spec = parse_push_refspec(self.repo, text)?;
        match self
            .specs
            .binary_search_by(|existing| existing.dst.cmp(&spec.dst))
        {
            Ok(_) => Err(PushError::InvalidReference {
                name: spec.dst,
                reason: "duplicate destination".into(),
            }),
            Err(pos) => {
                debug!(src = %spec.src, dst = %spec.dst, force = spec.force, "refspec added");
                self.specs.insert(pos, spec);
                Ok(())
            }
        }
    }

    /// Run the push attempt.
    pub async fn finish(&mut self, callbacks: &mut PushCallbacks<'_>) -> PushResult<()> {
        self.require_idle("finish")?;
        match self.run(callbacks).await {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!(
                    remote = %self.remote.name(),
                    state = ?self.state,
                    error = %e,
                    "push failed"
                );
                self.state = PushState::Failed(e.to_string());
                Err(e)
            }
        }
    }

    async fn run(&mut self, callbacks: &mut PushCallbacks<'_>) -> PushResult<()> {
        if !self.remote.connected() {
            self.remote.connect(Direction::Push).await?;
        }
        self.transition(PushState::Connected);
        if !self.remote.supports_push() {
            return Err(PushError::TransportUnsupported);
        }

        let heads = self.remote.ls().await?.to_vec();
        self.updates = WorkResolver::resolve(self.repo, &mut self.specs, &heads)?;
        self.transition(PushState::WorkResolved);

        if let Some(negotiate) = callbacks.push_negotiation.as_mut() {
            negotiate(self.updates.as_slice()).map_err(|e| PushError::CallbackAborted {
                callback: "push_negotiation",
                reason: e.0,
            })?;
        }
        self.transition(PushState::Negotiated);

        let objects = self.repo.objects();
        let mut pack = PackBuilder::new(objects);
        pack.set_threads(self.options.pb_parallelism);
        if let Some(progress) = callbacks.pack_progress.as_mut() {
            pack.set_progress(move |p| progress(p).map_err(|e| e.0));
        }
        ObjectSetEnumerator::enumerate(objects, &self.specs, &heads)?
            .queue_into(&mut pack)
            .map_err(PushError::from_pack)?;
        self.transition(PushState::Enumerated);

        let request = PushRequest {
            pack: &mut pack,
            specs: &self.specs,
            report_status: self.options.report_status,
        };
        let report = self
            .remote
            .transport_mut()
            .push(request)
            .await
            .map_err(PushError::from_transport)?;
        drop(pack);

        self.statuses = report.statuses;
        self.statuses.sort_by(|a, b| a.ref_name.cmp(&b.ref_name));
        self.unpack_ok = report.unpack_ok;
        self.transition(PushState::Transmitted);

        if !self.unpack_ok {
            return Err(PushError::UnpackFailed);
        }

        self.update_tips(callbacks)?;
        self.transition(PushState::Reconciled);
        Ok(())
    }

    /// Move local tracking refs for every ref the remote accepted.
    ///
    /// [`Push::finish`] does this itself; calling it again re-applies the
    /// same statuses.
    pub fn update_tips(&mut self, callbacks: &mut PushCallbacks<'_>) -> PushResult<usize> {
        TipsReconciler::reconcile(
            self.repo,
            &*self.remote,
            &self.specs,
            &self.statuses,
            callbacks,
        )
    }

    /// Call `f` with each ref name and its rejection message, in ref name
    /// order. An error from `f` stops the iteration.
    pub fn status_foreach(
        &self,
        mut f: impl FnMut(&str, Option<&str>) -> Result<(), CallbackError>,
    ) -> PushResult<()> {
        for status in &self.statuses {
            f(status.ref_name.as_str(), status.message.as_deref()).map_err(|e| {
                PushError::CallbackAborted {
                    callback: "status_foreach",
                    reason: e.0,
                }
            })?;
        }
        Ok(())
    }

    pub fn specs(&self) -> &[UpdateSpec] {
        &self.specs
    }

    pub fn updates(&self) -> &[PushUpdate] {
        &self.updates
    }

    pub fn statuses(&self) -> &[PushStatus] {
        &self.statuses
    }

    pub fn state(&self) -> &PushState {
        &self.state
    }

    /// Whether the remote reported that it unpacked what was sent.
    pub fn unpack_ok(&self) -> bool {
        self.unpack_ok
    }

    pub fn remote(&self) -> &Remote {
        &*self.remote
    }

    fn require_idle(&self, operation: &str) -> PushResult<()> {
        if self.state == PushState::Idle {
            Ok(())
        } else {
            Err(PushError::InvalidState(format!(
                "cannot {operation} in state {:?}",
                self.state
            )))
        }
    }

    fn transition(&mut self, next: PushState) {
        debug!(remote = %self.remote.name(), from = ?self.state, to = ?next, "push state");
        self.state = next;
    }
}

impl std::fmt::Debug for Push<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Push")
            .field("remote", &self.remote.name())
            .field("specs", &self.specs.len())
            .field("statuses", &self.statuses.len())
            .field("state", &self.state)
            .finish()
    }
}
