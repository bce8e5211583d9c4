//! Computing the outgoing object set.
//!
//! Every update that actually moves a ref contributes its new value. Tag
//! chains are peeled here, since the walk only follows commit parents and
//! would never see the tags themselves; commits at the end of a chain seed
//! a time-ordered [`RevWalk`], anything else is sent as is. Every head the
//! remote advertises is hidden so history it already holds stays home.

use tracing::debug;

use skiff_pack::{PackBuilder, PackResult};
use skiff_revwalk::{RevWalk, Sorting};
use skiff_store::{ObjectKind, ObjectStore, StoreError};
use skiff_types::ObjectId;

use crate::error::PushResult;
use crate::fast_forward::FastForwardValidator;
use crate::types::{RemoteHead, UpdateSpec};

/// The enumerated object set, not yet encoded.
pub struct Enumeration<'s> {
    /// Objects sent without walking: every tag of every peeled chain, and
    /// non-commit tag targets.
    pub direct: Vec<(ObjectId, ObjectKind)>,
    /// Wants are the new commit tips; haves are the remote heads.
    pub walk: RevWalk<'s>,
}

impl Enumeration<'_> {
    pub fn direct_ids(&self) -> impl Iterator<Item = &ObjectId> + '_ {
        self.direct.iter().map(|(id, _)| id)
    }

    /// Hand the set to the pack builder: direct objects first, then the
    /// walk's commits with the trees and blobs they introduce.
    pub fn queue_into(&self, pack: &mut PackBuilder<'_>) -> PackResult<()> {
        for (id, kind) in &self.direct {
            match kind {
                ObjectKind::Tree => pack.insert_tree(id)?,
                _ => {
                    pack.insert(id)?;
                }
            }
        }
        pack.insert_walk(&self.walk)
    }
}

pub struct ObjectSetEnumerator;

impl ObjectSetEnumerator {
    /// Build the object set for `specs`, which must already be resolved.
    ///
    /// Deletions and updates whose local and remote ids agree contribute
    /// nothing. The first non-fast-forward or read failure aborts the whole
    /// enumeration.
    pub fn enumerate<'s>(
        store: &'s dyn ObjectStore,
        specs: &[UpdateSpec],
        heads: &[RemoteHead],
    ) -> PushResult<Enumeration<'s>> {
        let mut walk = RevWalk::new(store);
        walk.set_sorting(Sorting::Time);
        let mut direct = Vec::new();

        for spec in specs {
            if spec.is_delete() || spec.is_up_to_date() {
                continue;
            }
            let (kind, _) = store
                .read_header(&spec.local_id)?
                .ok_or(StoreError::NotFound(spec.local_id))?;

            FastForwardValidator::check(store, spec)?;

            let mut current = (spec.local_id, kind);
            while current.1 == ObjectKind::Tag {
                direct.push(current);
                let target = store.read_tag(&current.0)?.target;
                let (kind, _) = store
                    .read_header(&target)?
                    .ok_or(StoreError::NotFound(target))?;
                current = (target, kind);
            }

            match current {
                (commit, ObjectKind::Commit) => walk.push(&commit)?,
                other => direct.push(other),
            }
        }

        for head in heads.iter().filter(|head| !head.id.is_null()) {
            if let Err(e) = walk.hide(&head.id) {
                debug!(
                    head = %head.name,
                    id = %head.id.short_hex(),
                    error = %e,
                    "not hiding remote head"
                );
            }
        }

        debug!(
            wants = walk.wants().len(),
            direct = direct.len(),
            "object set enumerated"
        );
        Ok(Enumeration { direct, walk })
    }
}
