//! Non-fast-forward detection.

use tracing::debug;

use skiff_revwalk::{merge_base, peel_to_commit, DagError};
use skiff_store::ObjectStore;

use crate::error::{NonFastForwardReason, PushError, PushResult};
use crate::types::UpdateSpec;

/// Refuses updates that would discard history on the remote.
pub struct FastForwardValidator;

impl FastForwardValidator {
    /// Check one resolved update against the local object store.
    ///
    /// Forced updates, creations (null remote id) and deletions always
    /// pass. Otherwise both tips are peeled through annotated tags, and the
    /// peeled remote commit must be the merge base of the two. A remote tip
    /// absent locally, or a tag whose chain ends at a missing object, is
    /// [`NonFastForwardReason::RemoteObjectMissing`]; a tip that peels to
    /// something other than a commit cannot be fast-forwarded.
    pub fn check(store: &dyn ObjectStore, spec: &UpdateSpec) -> PushResult<()> {
        if spec.force || spec.remote_id.is_null() || spec.is_delete() {
            return Ok(());
        }
        let reject = |reason| PushError::NonFastForward {
            reference: spec.dst.clone(),
            reason,
        };

        if !store.exists(&spec.remote_id)? {
            return Err(reject(NonFastForwardReason::RemoteObjectMissing));
        }
        let remote = match peel_to_commit(store, &spec.remote_id) {
            Ok(commit) => commit,
            Err(DagError::NotFound(_)) => {
                return Err(reject(NonFastForwardReason::RemoteObjectMissing))
            }
            Err(DagError::NotACommit { .. }) => {
                return Err(reject(NonFastForwardReason::NotAnAncestor))
            }
            Err(e) => return Err(e.into()),
        };
        let local = match peel_to_commit(store, &spec.local_id) {
            Ok(commit) => commit,
            Err(DagError::NotACommit { .. }) => {
                return Err(reject(NonFastForwardReason::NotAnAncestor))
            }
            Err(e) => return Err(e.into()),
        };

        match merge_base(store, &local, &remote)? {
            Some(base) if base == remote => {
                debug!(
                    reference = %spec.dst,
                    from = %remote.short_hex(),
                    to = %local.short_hex(),
                    "fast-forward"
                );
                Ok(())
            }
            _ => Err(reject(NonFastForwardReason::NotAnAncestor)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::testing::TestRepo;
    use proptest::prelude::*;
    use skiff_refs::RefSpec;
    use skiff_store::{ObjectKind, Tag};
    use skiff_types::ObjectId;

    fn spec(local: ObjectId, remote: ObjectId, force: bool) -> UpdateSpec {
        let mut spec = UpdateSpec::from_refspec(RefSpec::push("refs/heads/main", "refs/heads/main"));
        spec.force = force;
        spec.local_id = local;
        spec.remote_id = remote;
        spec
    }

    fn reason(err: PushError) -> NonFastForwardReason {
        match err {
            PushError::NonFastForward { reason, .. } => reason,
            other => panic!("expected non-fast-forward, got {other}"),
        }
    }

    #[test]
    fn descendant_passes() {
        let mut repo = TestRepo::new();
        let c1 = repo.commit("c1", &[]);
        let c2 = repo.commit("c2", &[c1]);
        let c3 = repo.commit("c3", &[c2]);
        FastForwardValidator::check(repo.objects.as_ref(), &spec(c3, c1, false)).unwrap();
        FastForwardValidator::check(repo.objects.as_ref(), &spec(c2, c2, false)).unwrap();
    }

    #[test]
    fn creation_force_and_delete_skip_the_check() {
        let mut repo = TestRepo::new();
        let c1 = repo.commit("c1", &[]);
        let unrelated = repo.commit("x", &[]);
        let store = repo.objects.as_ref();
        FastForwardValidator::check(store, &spec(c1, ObjectId::NULL, false)).unwrap();
        FastForwardValidator::check(store, &spec(c1, unrelated, true)).unwrap();

        let mut delete = UpdateSpec::from_refspec(RefSpec::push("", "refs/heads/main"));
        delete.remote_id = unrelated;
        FastForwardValidator::check(store, &delete).unwrap();
    }

    #[test]
    fn unrelated_history_is_rejected() {
        let mut repo = TestRepo::new();
        let c1 = repo.commit("c1", &[]);
        let c2 = repo.commit("c2", &[c1]);
        let c3 = repo.commit("c3", &[]);
        let err = FastForwardValidator::check(repo.objects.as_ref(), &spec(c2, c3, false))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NonFastForward);
        assert_eq!(reason(err), NonFastForwardReason::NotAnAncestor);
    }

    #[test]
    fn rewinding_is_rejected() {
        let mut repo = TestRepo::new();
        let c1 = repo.commit("c1", &[]);
        let c2 = repo.commit("c2", &[c1]);
        let err =
            FastForwardValidator::check(repo.objects.as_ref(), &spec(c1, c2, false)).unwrap_err();
        assert_eq!(reason(err), NonFastForwardReason::NotAnAncestor);
    }

    #[test]
    fn missing_remote_object_is_rejected() {
        let mut repo = TestRepo::new();
        let c1 = repo.commit("c1", &[]);
        let missing = ObjectId::from_bytes(b"elsewhere");
        let err = FastForwardValidator::check(repo.objects.as_ref(), &spec(c1, missing, false))
            .unwrap_err();
        assert_eq!(reason(err), NonFastForwardReason::RemoteObjectMissing);
    }

    #[test]
    fn tag_over_a_descendant_passes() {
        let mut repo = TestRepo::new();
        let c1 = repo.commit("c1", &[]);
        let c2 = repo.commit("c2", &[c1]);
        let tag = repo.tag("v2", c2);
        FastForwardValidator::check(repo.objects.as_ref(), &spec(tag, c1, false)).unwrap();
    }

    #[test]
    fn remote_tag_is_peeled_before_the_ancestry_check() {
        let mut repo = TestRepo::new();
        let c1 = repo.commit("c1", &[]);
        let c2 = repo.commit("c2", &[c1]);
        let inner = repo.tag("v1", c1);
        let outer = repo.tag("v1-signed", inner);
        let store = repo.objects.as_ref();

        FastForwardValidator::check(store, &spec(c2, outer, false)).unwrap();

        let newer = repo.tag("v2", c2);
        let err = FastForwardValidator::check(store, &spec(c1, newer, false)).unwrap_err();
        assert_eq!(reason(err), NonFastForwardReason::NotAnAncestor);
    }

    #[test]
    fn remote_tag_over_a_missing_object_is_missing() {
        let mut repo = TestRepo::new();
        let c1 = repo.commit("c1", &[]);
        let tag = Tag {
            target: ObjectId::from_bytes(b"elsewhere"),
            target_kind: ObjectKind::Commit,
            name: "gone".into(),
            tagger: None,
            message: String::new(),
        };
        let dangling = repo.objects.write(&tag.to_stored_object().unwrap()).unwrap();
        let err = FastForwardValidator::check(repo.objects.as_ref(), &spec(c1, dangling, false))
            .unwrap_err();
        assert_eq!(reason(err), NonFastForwardReason::RemoteObjectMissing);
    }

    #[test]
    fn non_commit_values_are_not_fast_forwards() {
        let mut repo = TestRepo::new();
        let c1 = repo.commit("c1", &[]);
        let blob = repo.blob("data");
        let store = repo.objects.as_ref();
        assert_eq!(
            reason(FastForwardValidator::check(store, &spec(blob, c1, false)).unwrap_err()),
            NonFastForwardReason::NotAnAncestor
        );
        assert_eq!(
            reason(FastForwardValidator::check(store, &spec(c1, blob, false)).unwrap_err()),
            NonFastForwardReason::NotAnAncestor
        );
    }

    proptest! {
        /// On a chain with a side branch, the check passes exactly when the
        /// remote tip is an ancestor of the local one.
        #[test]
        fn passes_iff_ancestor(len in 1usize..8, side in 0usize..4, local in 0usize..12, remote in 0usize..12) {
            let mut repo = TestRepo::new();
            let mut chain = vec![repo.commit("c0", &[])];
            for i in 1..len {
                let next = repo.commit(&format!("c{i}"), &[chain[i - 1]]);
                chain.push(next);
            }
            // A side branch forking off the root.
            let mut all = chain.clone();
            let mut tip = chain[0];
            for i in 0..side {
                tip = repo.commit(&format!("s{i}"), &[tip]);
                all.push(tip);
            }

            let l = all[local % all.len()];
            let r = all[remote % all.len()];
            let store = repo.objects.as_ref();
            let expected = skiff_revwalk::is_ancestor(store, &r, &l).unwrap();
            let result = FastForwardValidator::check(store, &spec(l, r, false));
            prop_assert_eq!(result.is_ok(), expected);
        }
    }
}
