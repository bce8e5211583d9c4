//! Revision walks: commits reachable from the pushed tips but not from the
//! hidden ones.
//!
//! The walk reads commits straight from the object store. Hidden tips are
//! expanded to their full ancestor closure first; the wanted tips are then
//! walked until every path runs into that closure or a root commit.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet, VecDeque};

use tracing::debug;

use skiff_store::{ObjectKind, ObjectStore};
use skiff_types::ObjectId;

use crate::error::{DagError, DagResult};

/// Output order of a walk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Sorting {
    /// Breadth-first discovery order from the tips.
    #[default]
    None,
    /// Newest committer time first; ties broken by id.
    Time,
}

/// The result of a walk.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Walk {
    /// Commits reachable from the wanted tips and not from the hidden ones.
    pub commits: Vec<ObjectId>,
    /// Hidden commits that are direct parents of walked commits. Their
    /// trees are what the other side already has.
    pub boundary: Vec<ObjectId>,
}

impl Walk {
    pub fn len(&self) -> usize {
        self.commits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }
}

/// Follow annotated tags until something that is not a tag is reached.
///
/// Returns the final object's id and kind.
pub fn peel(store: &dyn ObjectStore, id: &ObjectId) -> DagResult<(ObjectId, ObjectKind)> {
    let mut current = *id;
    loop {
        let (kind, _) = store
            .read_header(&current)?
            .ok_or(DagError::NotFound(current))?;
        if kind != ObjectKind::Tag {
            return Ok((current, kind));
        }
        current = store.read_tag(&current)?.target;
    }
}

/// Peel `id` and require the result to be a commit.
pub fn peel_to_commit(store: &dyn ObjectStore, id: &ObjectId) -> DagResult<ObjectId> {
    match peel(store, id)? {
        (commit, ObjectKind::Commit) => Ok(commit),
        (other, kind) => Err(DagError::NotACommit { id: other, kind }),
    }
}

/// Heap entry ordering commits by time, newest first.
#[derive(PartialEq, Eq)]
struct Queued {
    time: i64,
    id: ObjectId,
}

impl Ord for Queued {
    fn cmp(&self, other: &Self) -> Ordering {
        self.time
            .cmp(&other.time)
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialOrd for Queued {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

enum Frontier {
    Fifo(VecDeque<ObjectId>),
    Time(BinaryHeap<Queued>),
}

impl Frontier {
    fn pop(&mut self) -> Option<ObjectId> {
        match self {
            Self::Fifo(queue) => queue.pop_front(),
            Self::Time(heap) => heap.pop().map(|q| q.id),
        }
    }

    fn push(&mut self, id: ObjectId, time: i64) {
        match self {
            Self::Fifo(queue) => queue.push_back(id),
            Self::Time(heap) => heap.push(Queued { time, id }),
        }
    }
}

/// A configurable commit walk over an object store.
///
/// ```ignore
/// let mut walk = RevWalk::new(store);
/// walk.set_sorting(Sorting::Time);
/// walk.push(&local_tip)?;
/// walk.hide(&remote_tip)?;
/// let result = walk.walk()?;
/// ```
pub struct RevWalk<'s> {
    store: &'s dyn ObjectStore,
    sorting: Sorting,
    wants: Vec<ObjectId>,
    hidden: Vec<ObjectId>,
}

impl<'s> RevWalk<'s> {
    pub fn new(store: &'s dyn ObjectStore) -> Self {
        Self {
            store,
            sorting: Sorting::default(),
            wants: Vec::new(),
            hidden: Vec::new(),
        }
    }

    pub fn store(&self) -> &'s dyn ObjectStore {
        self.store
    }

    pub fn set_sorting(&mut self, sorting: Sorting) {
        self.sorting = sorting;
    }

    /// Start walking from `id`, which must peel to a commit.
    pub fn push(&mut self, id: &ObjectId) -> DagResult<()> {
        let commit = peel_to_commit(self.store, id)?;
        if !self.wants.contains(&commit) {
            self.wants.push(commit);
        }
        Ok(())
    }

    /// Exclude `id` and everything reachable from it.
    ///
    /// Fails if `id` is missing or does not peel to a commit; callers that
    /// hide speculatively are free to ignore the error.
    pub fn hide(&mut self, id: &ObjectId) -> DagResult<()> {
        let commit = peel_to_commit(self.store, id)?;
        if !self.hidden.contains(&commit) {
            self.hidden.push(commit);
        }
        Ok(())
    }

    /// Tips pushed so far, peeled to commits.
    pub fn wants(&self) -> &[ObjectId] {
        &self.wants
    }

    /// Run the walk.
    pub fn walk(&self) -> DagResult<Walk> {
        let hidden = self.hidden_closure()?;
        let mut seen: HashSet<ObjectId> = HashSet::new();
        let mut boundary: Vec<ObjectId> = Vec::new();
        let mut boundary_seen: HashSet<ObjectId> = HashSet::new();
        let mut commits = Vec::new();

        let mut frontier = match self.sorting {
            Sorting::None => Frontier::Fifo(VecDeque::new()),
            Sorting::Time => Frontier::Time(BinaryHeap::new()),
        };
        for want in &self.wants {
            if hidden.contains(want) || !seen.insert(*want) {
                continue;
            }
            let time = self.store.read_commit(want)?.time();
            frontier.push(*want, time);
        }

        while let Some(id) = frontier.pop() {
            let commit = self.store.read_commit(&id)?;
            commits.push(id);
            for parent in &commit.parents {
                if hidden.contains(parent) {
                    if boundary_seen.insert(*parent) {
                        boundary.push(*parent);
                    }
                    continue;
                }
                if !seen.insert(*parent) {
                    continue;
                }
                let parent_commit = match self.store.read(parent)? {
                    Some(obj) => skiff_store::Commit::from_stored_object(&obj)?,
                    None => {
                        return Err(DagError::MissingParent {
                            commit: id,
                            parent: *parent,
                        })
                    }
                };
                frontier.push(*parent, parent_commit.time());
            }
        }

        debug!(
            wants = self.wants.len(),
            hidden = self.hidden.len(),
            commits = commits.len(),
            boundary = boundary.len(),
            "revision walk finished"
        );
        Ok(Walk { commits, boundary })
    }

    /// Every commit reachable from a hidden tip. Missing ancestors end the
    /// closure quietly, the way a shallow history does.
    fn hidden_closure(&self) -> DagResult<HashSet<ObjectId>> {
        let mut closure = HashSet::new();
        let mut queue: VecDeque<ObjectId> = self.hidden.iter().copied().collect();
        while let Some(id) = queue.pop_front() {
            if !closure.insert(id) {
                continue;
            }
            let Some(obj) = self.store.read(&id)? else {
                continue;
            };
            let commit = skiff_store::Commit::from_stored_object(&obj)?;
            queue.extend(commit.parents.iter().filter(|p| !closure.contains(*p)));
        }
        Ok(closure)
    }
}
