//! Commits tracked through one submission

use crate::types::{ChangeId, CommitId, PatchSetId};
use serde::{Deserialize, Serialize};

/// A graph commit bound to the patch set it was submitted as.
///
/// The destination branch head is also a `TrackedCommit`, usually without
/// a patch set. Outcomes are kept in [`OutcomeMap`](crate::outcome::OutcomeMap),
/// not on the commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedCommit {
    /// Commit identity
    pub id: CommitId,
    /// Parent commit ids, first parent first
    pub parents: Vec<CommitId>,
    /// Full commit message
    pub message: String,
    /// Patch set this commit was uploaded as
    pub patch_set: Option<PatchSetId>,
}

impl TrackedCommit {
    /// Track a commit that is not part of any change (e.g. a branch head)
    pub fn untracked(id: CommitId, parents: Vec<CommitId>, message: impl Into<String>) -> Self {
        Self {
            id,
            parents,
            message: message.into(),
            patch_set: None,
        }
    }

    /// Track a commit submitted as `patch_set`
    pub fn for_patch_set(
        id: CommitId,
        parents: Vec<CommitId>,
        message: impl Into<String>,
        patch_set: PatchSetId,
    ) -> Self {
        Self {
            id,
            parents,
            message: message.into(),
            patch_set: Some(patch_set),
        }
    }

    /// Change owning this commit's patch set
    pub fn change(&self) -> Option<ChangeId> {
        self.patch_set.map(|ps| ps.change)
    }
}

/// Candidate commits for one branch, in submission order.
///
/// Entries only ever leave the set.
#[derive(Debug, Clone, Default)]
pub struct PendingSet {
    commits: Vec<TrackedCommit>,
}

impl PendingSet {
    /// Create a pending set, dropping duplicate commit ids
    pub fn new(commits: Vec<TrackedCommit>) -> Self {
        let mut unique: Vec<TrackedCommit> = Vec::with_capacity(commits.len());
        for commit in commits {
            if !unique.iter().any(|c| c.id == commit.id) {
                unique.push(commit);
            }
        }
        Self { commits: unique }
    }

    /// Remaining commits in order
    pub fn commits(&self) -> &[TrackedCommit] {
        &self.commits
    }

    /// Whether `id` is still pending
    pub fn contains(&self, id: &CommitId) -> bool {
        self.commits.iter().any(|c| &c.id == id)
    }

    /// Remove and return the commit with `id`
    pub fn take(&mut self, id: &CommitId) -> Option<TrackedCommit> {
        let idx = self.commits.iter().position(|c| &c.id == id)?;
        Some(self.commits.remove(idx))
    }

    /// Remove every remaining commit, in order
    pub fn drain(&mut self) -> Vec<TrackedCommit> {
        std::mem::take(&mut self.commits)
    }

    /// Remove the commits matching `pred`, keeping order of both halves
    pub fn extract_if(&mut self, pred: impl FnMut(&TrackedCommit) -> bool) -> Vec<TrackedCommit> {
        let (taken, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.commits)
            .into_iter()
            .partition(pred);
        self.commits = kept;
        taken
    }

    /// Number of remaining commits
    pub fn len(&self) -> usize {
        self.commits.len()
    }

    /// Whether nothing remains
    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }
}
