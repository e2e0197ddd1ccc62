//! Commit graph access
//!
//! The engine reads history through [`CommitGraph`] and moves branches
//! through [`RefUpdater`]. Two backends ship with the crate: an in-memory
//! graph for tests and batch simulation, and a git repository read and
//! updated through `gix`.

mod git;
mod memory;
mod reduce;
mod walk;

pub use git::GitRepository;
pub use memory::InMemoryGraph;
pub use reduce::{MergeUtil, Reduction};
pub use walk::{RevSort, RevWalk};

use crate::error::Result;
use crate::types::CommitId;
use std::collections::{HashSet, VecDeque};
use std::path::Path;

/// A parsed commit object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphCommit {
    /// Commit identity
    pub id: CommitId,
    /// Parent ids, first parent first
    pub parents: Vec<CommitId>,
    /// Full commit message
    pub message: String,
}

/// Read access to the object store
pub trait CommitGraph: Send + Sync {
    /// Parse a commit by id
    fn parse_commit(&self, id: &CommitId) -> Result<GraphCommit>;

    /// Filesystem location of the repository (handed to hooks)
    fn path(&self) -> &Path;

    /// Whether `ancestor` is reachable from `descendant` (a commit is its own ancestor)
    fn is_ancestor(&self, ancestor: &CommitId, descendant: &CommitId) -> Result<bool> {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([descendant.clone()]);
        while let Some(id) = queue.pop_front() {
            if &id == ancestor {
                return Ok(true);
            }
            if !seen.insert(id.clone()) {
                continue;
            }
            queue.extend(self.parse_commit(&id)?.parents);
        }
        Ok(false)
    }
}

/// Result of a compare-and-swap on a ref
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefUpdateStatus {
    /// Ref now points at the new id
    Updated,
    /// Ref did not hold the expected value
    LockFailure {
        /// Value found instead
        actual: Option<CommitId>,
    },
}

/// Write access to refs
pub trait RefUpdater: Send + Sync {
    /// Current value of `name`
    fn read_ref(&self, name: &str) -> Result<Option<CommitId>>;

    /// Move `name` from `expected` to `new`, failing if someone else moved it first
    fn compare_and_swap(
        &self,
        name: &str,
        expected: Option<&CommitId>,
        new: &CommitId,
    ) -> Result<RefUpdateStatus>;
}
