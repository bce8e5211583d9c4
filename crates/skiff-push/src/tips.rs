//! Moving local tracking refs to match what the remote accepted.

use tracing::debug;

use crate::callbacks::PushCallbacks;
use crate::error::{PushError, PushResult};
use crate::remote::Remote;
use crate::repository::Repository;
use crate::types::{PushStatus, UpdateSpec};

/// Reflog message recorded on tracking refs moved by a push.
pub const UPDATE_BY_PUSH: &str = "update by push";

pub struct TipsReconciler;

impl TipsReconciler {
    /// Apply every accepted status to its tracking ref.
    ///
    /// Statuses carrying a message, refs no fetch refspec maps, and refs
    /// with no matching update are skipped. `specs` must be sorted by
    /// destination. Deleting a tracking ref that is already gone counts as
    /// done. The `update_tips` callback runs after each ref is handled; an
    /// error from it stops reconciliation with the earlier refs left
    /// updated.
    ///
    /// Returns how many tracking refs were handled.
    pub fn reconcile(
        repo: &Repository,
        remote: &Remote,
        specs: &[UpdateSpec],
        statuses: &[PushStatus],
        callbacks: &mut PushCallbacks<'_>,
    ) -> PushResult<usize> {
        let mut handled = 0;
        for status in statuses.iter().filter(|status| status.is_ok()) {
            let Some(fetch) = remote.matching_fetch_refspec(&status.ref_name) else {
                continue;
            };
            let Some(tracking) = fetch.transform(&status.ref_name) else {
                continue;
            };
            let Ok(pos) = specs.binary_search_by(|spec| spec.dst.as_str().cmp(&status.ref_name))
            else {
                continue;
            };
            let spec = &specs[pos];

            if spec.local_id.is_null() {
                if !repo.refs.delete(&tracking)? {
                    debug!(tracking = %tracking, "tracking ref already absent");
                }
            } else {
                repo.refs
                    .create(&tracking, spec.local_id, true, UPDATE_BY_PUSH)?;
            }
            debug!(
                reference = %status.ref_name,
                tracking = %tracking,
                id = %spec.local_id.short_hex(),
                "tracking ref updated"
            );
            handled += 1;

            if let Some(update_tips) = callbacks.update_tips.as_mut() {
                update_tips(tracking.as_str(), &spec.remote_id, &spec.local_id).map_err(|e| {
                    PushError::CallbackAborted {
                        callback: "update_tips",
                        reason: e.0,
                    }
                })?;
            }
        }
        Ok(handled)
    }
}
