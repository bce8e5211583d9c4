//! Building the outgoing object set and encoding it as a pack.
//!
//! [`PackBuilder`] collects object ids in insertion order, without
//! duplicates, either one at a time or by finishing a [`RevWalk`]: every
//! walked commit goes in together with the trees and blobs it introduces,
//! and anything already reachable from the walk's boundary commits is left
//! out since the receiving side has it.

use std::collections::HashSet;
use std::num::NonZeroUsize;

use tracing::debug;

use skiff_revwalk::RevWalk;
use skiff_store::{EntryMode, ObjectStore};
use skiff_types::ObjectId;

use crate::error::{PackError, PackResult};
use crate::index::PackIndex;
use crate::writer::PackWriter;

/// Phase of pack building reported to the progress callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PackStage {
    Adding,
    Compressing,
    Writing,
}

/// A progress report.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PackProgress {
    pub stage: PackStage,
    pub current: usize,
    pub total: usize,
}

/// Progress callback. Returning `Err` aborts pack building with
/// [`PackError::Aborted`].
pub type ProgressFn<'a> = Box<dyn FnMut(&PackProgress) -> Result<(), String> + Send + 'a>;

pub struct PackBuilder<'a> {
    store: &'a dyn ObjectStore,
    threads: usize,
    progress: Option<ProgressFn<'a>>,
    order: Vec<ObjectId>,
    seen: HashSet<ObjectId>,
}

impl<'a> PackBuilder<'a> {
    pub fn new(store: &'a dyn ObjectStore) -> Self {
        Self {
            store,
            threads: 1,
            progress: None,
            order: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Worker-count hint for compression. `0` means one worker per
    /// available CPU.
    pub fn set_threads(&mut self, threads: usize) -> usize {
        self.threads = if threads == 0 {
            std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1)
        } else {
            threads
        };
        self.threads
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    pub fn set_progress(
        &mut self,
        callback: impl FnMut(&PackProgress) -> Result<(), String> + Send + 'a,
    ) {
        self.progress = Some(Box::new(callback));
    }

    fn report(&mut self, stage: PackStage, current: usize, total: usize) -> PackResult<()> {
        if let Some(progress) = self.progress.as_mut() {
            progress(&PackProgress {
                stage,
                current,
                total,
            })
            .map_err(PackError::Aborted)?;
        }
        Ok(())
    }

    /// Add one object. Returns `false` if it was already present.
    ///
    /// The object must exist in the store.
    pub fn insert(&mut self, id: &ObjectId) -> PackResult<bool> {
        if self.seen.contains(id) {
            return Ok(false);
        }
        if self.store.read_header(id)?.is_none() {
            return Err(skiff_store::StoreError::NotFound(*id).into());
        }
        self.seen.insert(*id);
        self.order.push(*id);
        let count = self.order.len();
        self.report(PackStage::Adding, count, count)?;
        Ok(true)
    }

    /// Add a tree and everything below it.
    pub fn insert_tree(&mut self, id: &ObjectId) -> PackResult<()> {
        self.insert_tree_excluding(id, &HashSet::new())
    }

    fn insert_tree_excluding(
        &mut self,
        id: &ObjectId,
        exclude: &HashSet<ObjectId>,
    ) -> PackResult<()> {
        let mut stack = vec![*id];
        while let Some(tree_id) = stack.pop() {
            if exclude.contains(&tree_id) || !self.insert(&tree_id)? {
                continue;
            }
            let tree = self.store.read_tree(&tree_id)?;
            for entry in tree.entries.iter().rev() {
                match entry.mode {
                    // Submodule commits live in another repository.
                    EntryMode::Commit => {}
                    EntryMode::Directory => stack.push(entry.object_id),
                    _ => {
                        if !exclude.contains(&entry.object_id) {
                            self.insert(&entry.object_id)?;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Finish a revision walk: add every walked commit, then the trees and
    /// blobs they reference that the boundary commits do not already reach.
    pub fn insert_walk(&mut self, walk: &RevWalk<'_>) -> PackResult<()> {
        let result = walk.walk()?;

        let mut have = HashSet::new();
        for commit_id in &result.boundary {
            let commit = self.store.read_commit(commit_id)?;
            self.collect_tree(&commit.tree, &mut have)?;
        }

        let mut trees = Vec::with_capacity(result.commits.len());
        for commit_id in &result.commits {
            trees.push(self.store.read_commit(commit_id)?.tree);
            self.insert(commit_id)?;
        }
        for tree in &trees {
            self.insert_tree_excluding(tree, &have)?;
        }

        debug!(
            commits = result.commits.len(),
            boundary = result.boundary.len(),
            excluded = have.len(),
            total = self.order.len(),
            "walk inserted into pack"
        );
        Ok(())
    }

    /// Every tree and blob id reachable from `root`.
    fn collect_tree(&self, root: &ObjectId, into: &mut HashSet<ObjectId>) -> PackResult<()> {
        let mut stack = vec![*root];
        while let Some(tree_id) = stack.pop() {
            if !into.insert(tree_id) {
                continue;
            }
            let tree = self.store.read_tree(&tree_id)?;
            for entry in &tree.entries {
                match entry.mode {
                    EntryMode::Commit => {}
                    EntryMode::Directory => stack.push(entry.object_id),
                    _ => {
                        into.insert(entry.object_id);
                    }
                }
            }
        }
        Ok(())
    }

    /// Objects queued so far, in insertion order.
    pub fn object_ids(&self) -> &[ObjectId] {
        &self.order
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.seen.contains(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Encode every queued object into pack bytes.
    pub fn write_to_vec(&mut self) -> PackResult<(Vec<u8>, PackIndex)> {
        let total = self.order.len();
        let mut writer = PackWriter::new();
        for id in &self.order {
            writer.add(*id, self.store.find(id)?);
        }

        self.report(PackStage::Compressing, 0, total)?;
        let (bytes, index) = if self.threads > 1 && total > 1 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.threads)
                .build()
                .map_err(|e| PackError::ThreadPool(e.to_string()))?;
            writer.finish_on_pool(&pool)?
        } else {
            writer.finish_to_bytes()?
        };
        self.report(PackStage::Compressing, total, total)?;
        self.report(PackStage::Writing, total, total)?;

        debug!(
            objects = total,
            bytes = bytes.len(),
            threads = self.threads,
            "pack written"
        );
        Ok((bytes, index))
    }
}

impl std::fmt::Debug for PackBuilder<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackBuilder")
            .field("threads", &self.threads)
            .field("objects", &self.order.len())
            .finish()
    }
}
