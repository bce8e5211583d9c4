//! Filling in the local and remote ids of each update.

use tracing::debug;

use skiff_types::ObjectId;

use crate::error::PushResult;
use crate::repository::Repository;
use crate::types::{PushUpdate, RemoteHead, UpdateSpec};

/// Resolves every [`UpdateSpec`] against the local repository and the
/// remote's advertised heads.
pub struct WorkResolver;

impl WorkResolver {
    /// Set `local_id` from the source ref and `remote_id` from the head
    /// advertised under the destination name, then return the update list
    /// in spec order.
    ///
    /// The source is looked up by exact name here; shorthand accepted at
    /// parse time must already be fully qualified by then. A destination
    /// the remote does not advertise gets a null `remote_id`.
    pub fn resolve(
        repo: &Repository,
        specs: &mut [UpdateSpec],
        heads: &[RemoteHead],
    ) -> PushResult<Vec<PushUpdate>> {
        let mut updates = Vec::with_capacity(specs.len());
        for spec in specs.iter_mut() {
            spec.local_id = if spec.is_delete() {
                ObjectId::NULL
            } else {
                repo.reference_name_to_id(&spec.src)?
            };
            spec.remote_id = heads
                .iter()
                .find(|head| head.name == spec.dst)
                .map(|head| head.id)
                .unwrap_or(ObjectId::NULL);

            debug!(
                src = %spec.src,
                dst = %spec.dst,
                local = %spec.local_id.short_hex(),
                remote = %spec.remote_id.short_hex(),
                "resolved update"
            );
            updates.push(spec.to_update());
        }
        Ok(updates)
    }
}
