//! Merge bases and ancestry.

use std::collections::{HashSet, VecDeque};

use skiff_store::ObjectStore;
use skiff_types::ObjectId;

use crate::error::{DagError, DagResult};

/// Collect all ancestors of a commit (including the commit itself).
///
/// Parents that are not in the store end the traversal along that path.
fn ancestor_set(store: &dyn ObjectStore, id: &ObjectId) -> DagResult<HashSet<ObjectId>> {
    let mut visited = HashSet::new();
    let mut queue = VecDeque::new();
    visited.insert(*id);
    queue.push_back(*id);

    while let Some(current) = queue.pop_front() {
        let Some(obj) = store.read(&current)? else {
            continue;
        };
        let commit = skiff_store::Commit::from_stored_object(&obj)?;
        for parent in commit.parents {
            if visited.insert(parent) {
                queue.push_back(parent);
            }
        }
    }
    Ok(visited)
}

fn require_commit(store: &dyn ObjectStore, id: &ObjectId) -> DagResult<()> {
    store.read_commit(id).map(|_| ()).map_err(|e| match e {
        skiff_store::StoreError::NotFound(id) => DagError::NotFound(id),
        other => DagError::Store(other),
    })
}

/// Find the best common ancestor of two commits.
///
/// Among the common ancestors, those that are themselves ancestors of
/// another common ancestor are discarded; of what remains, the newest
/// commit wins, then the smallest id. Returns `Ok(None)` when the
/// histories are unrelated.
pub fn merge_base(
    store: &dyn ObjectStore,
    a: &ObjectId,
    b: &ObjectId,
) -> DagResult<Option<ObjectId>> {
    require_commit(store, a)?;
    require_commit(store, b)?;
    if a == b {
        return Ok(Some(*a));
    }

    let ancestors_a = ancestor_set(store, a)?;
    let ancestors_b = ancestor_set(store, b)?;
    let common: HashSet<ObjectId> = ancestors_a.intersection(&ancestors_b).copied().collect();
    if common.is_empty() {
        return Ok(None);
    }

    // Everything strictly below some common ancestor is redundant.
    let mut redundant = HashSet::new();
    let mut queue = VecDeque::new();
    for id in &common {
        if let Some(obj) = store.read(id)? {
            let commit = skiff_store::Commit::from_stored_object(&obj)?;
            queue.extend(commit.parents);
        }
    }
    while let Some(id) = queue.pop_front() {
        if !redundant.insert(id) {
            continue;
        }
        if let Some(obj) = store.read(&id)? {
            let commit = skiff_store::Commit::from_stored_object(&obj)?;
            queue.extend(commit.parents);
        }
    }

    let mut best: Option<(i64, ObjectId)> = None;
    for id in common.difference(&redundant) {
        let time = store.read_commit(id)?.time();
        best = match best {
            Some((t, current)) if t > time || (t == time && current < *id) => Some((t, current)),
            _ => Some((time, *id)),
        };
    }
    Ok(best.map(|(_, id)| id))
}

/// Is `ancestor` reachable from `descendant` (or equal to it)?
pub fn is_ancestor(
    store: &dyn ObjectStore,
    ancestor: &ObjectId,
    descendant: &ObjectId,
) -> DagResult<bool> {
    if ancestor == descendant {
        return Ok(true);
    }
    Ok(ancestor_set(store, descendant)?.contains(ancestor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::Graph;
    use proptest::prelude::*;

    #[test]
    fn same_commit() {
        let mut g = Graph::new();
        let a = g.commit("a", &[]);
        assert_eq!(merge_base(&g.store, &a, &a).unwrap(), Some(a));
    }

    #[test]
    fn linear_chain() {
        let mut g = Graph::new();
        let a = g.commit("a", &[]);
        let b = g.commit("b", &[a]);
        let c = g.commit("c", &[b]);
        assert_eq!(merge_base(&g.store, &b, &c).unwrap(), Some(b));
        assert_eq!(merge_base(&g.store, &c, &b).unwrap(), Some(b));
    }

    #[test]
    fn diamond() {
        let mut g = Graph::new();
        let a = g.commit("a", &[]);
        let b = g.commit("b", &[a]);
        let c = g.commit("c", &[a]);
        assert_eq!(merge_base(&g.store, &b, &c).unwrap(), Some(a));
    }

    #[test]
    fn older_but_better_base_wins_over_redundant_ones() {
        // root is common too, but only through y.
        let mut g = Graph::new();
        let root = g.commit_at("root", &[], 100);
        let y = g.commit_at("y", &[root], 200);
        let left = g.commit_at("left", &[y], 300);
        let right = g.commit_at("right", &[y, root], 400);
        assert_eq!(merge_base(&g.store, &left, &right).unwrap(), Some(y));
    }

    #[test]
    fn unrelated_histories() {
        let mut g = Graph::new();
        let a = g.commit("a", &[]);
        let b = g.commit("b", &[]);
        assert_eq!(merge_base(&g.store, &a, &b).unwrap(), None);
    }

    #[test]
    fn missing_commit_is_an_error() {
        let mut g = Graph::new();
        let a = g.commit("a", &[]);
        let ghost = ObjectId::from_bytes(b"ghost");
        assert!(matches!(
            merge_base(&g.store, &a, &ghost),
            Err(DagError::NotFound(id)) if id == ghost
        ));
    }

    #[test]
    fn ancestry() {
        let mut g = Graph::new();
        let a = g.commit("a", &[]);
        let b = g.commit("b", &[a]);
        let side = g.commit("side", &[a]);
        assert!(is_ancestor(&g.store, &a, &b).unwrap());
        assert!(is_ancestor(&g.store, &b, &b).unwrap());
        assert!(!is_ancestor(&g.store, &b, &a).unwrap());
        assert!(!is_ancestor(&g.store, &side, &b).unwrap());
    }

    proptest! {
        /// On a linear history the merge base of two commits is the older one.
        #[test]
        fn linear_merge_base_is_the_older_commit(len in 2usize..12, i in 0usize..12, j in 0usize..12) {
            let i = i % len;
            let j = j % len;
            let mut g = Graph::new();
            let mut chain = Vec::new();
            for n in 0..len {
                let parents: Vec<ObjectId> = chain.last().copied().into_iter().collect();
                chain.push(g.commit(&format!("c{n}"), &parents));
            }
            let base = merge_base(&g.store, &chain[i], &chain[j]).unwrap();
            prop_assert_eq!(base, Some(chain[i.min(j)]));
            prop_assert_eq!(is_ancestor(&g.store, &chain[i], &chain[j]).unwrap(), i <= j);
        }
    }
}
