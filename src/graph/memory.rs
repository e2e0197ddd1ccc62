//! In-memory commit graph
//!
//! Backs tests and batch simulation. Interior mutability lets tests grow
//! the graph or move refs while a strategy holds a shared reference.

use super::{CommitGraph, GraphCommit, RefUpdateStatus, RefUpdater};
use crate::error::{Error, Result};
use crate::types::CommitId;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Commit graph and ref table held in memory
#[derive(Debug)]
pub struct InMemoryGraph {
    path: PathBuf,
    commits: Mutex<HashMap<CommitId, GraphCommit>>,
    refs: Mutex<BTreeMap<String, CommitId>>,
    corrupt: Mutex<HashSet<CommitId>>,
}

impl InMemoryGraph {
    /// Create an empty graph reporting `path` as its location
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            commits: Mutex::new(HashMap::new()),
            refs: Mutex::new(BTreeMap::new()),
            corrupt: Mutex::new(HashSet::new()),
        }
    }

    /// Add a commit object
    pub fn add_commit(&self, id: CommitId, parents: &[CommitId], message: &str) {
        let commit = GraphCommit {
            id: id.clone(),
            parents: parents.to_vec(),
            message: message.to_string(),
        };
        lock(&self.commits).insert(id, commit);
    }

    /// Point `name` at `id`
    pub fn set_ref(&self, name: &str, id: CommitId) {
        lock(&self.refs).insert(name.to_string(), id);
    }

    /// Make reads of `id` fail as if the object were damaged
    pub fn corrupt(&self, id: &CommitId) {
        lock(&self.corrupt).insert(id.clone());
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    // A panic while holding the lock leaves plain data behind; keep using it.
    m.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

impl CommitGraph for InMemoryGraph {
    fn parse_commit(&self, id: &CommitId) -> Result<GraphCommit> {
        if lock(&self.corrupt).contains(id) {
            return Err(Error::Graph(format!("corrupt commit object {id}")));
        }
        lock(&self.commits)
            .get(id)
            .cloned()
            .ok_or_else(|| Error::MissingObject(id.clone()))
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl RefUpdater for InMemoryGraph {
    fn read_ref(&self, name: &str) -> Result<Option<CommitId>> {
        Ok(lock(&self.refs).get(name).cloned())
    }

    fn compare_and_swap(
        &self,
        name: &str,
        expected: Option<&CommitId>,
        new: &CommitId,
    ) -> Result<RefUpdateStatus> {
        let mut refs = lock(&self.refs);
        let actual = refs.get(name).cloned();
        if actual.as_ref() != expected {
            return Ok(RefUpdateStatus::LockFailure { actual });
        }
        refs.insert(name.to_string(), new.clone());
        Ok(RefUpdateStatus::Updated)
    }
}
