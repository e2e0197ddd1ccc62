//! Batch files
//!
//! A batch describes one approved submission in TOML: the destination
//! branch, the submitted patch sets and the review records the engine
//! reads. The CLI loads a batch into an [`InMemoryReviewStore`].

use super::InMemoryReviewStore;
use crate::commit::TrackedCommit;
use crate::error::{Error, Result};
use crate::graph::CommitGraph;
use crate::types::{
    Account, AccountId, BranchRef, ChangeId, ChangeMessage, CommitId, MessageKey, PatchSetId,
    SubmitApproval,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// One approved submission
#[derive(Debug, Clone, Deserialize)]
pub struct Batch {
    /// Project name
    pub project: String,
    /// Destination branch (short or full ref name)
    pub branch: String,
    /// Known accounts
    #[serde(default)]
    pub accounts: Vec<BatchAccount>,
    /// Submitted changes, in submission order
    #[serde(default)]
    pub changes: Vec<BatchChange>,
}

/// Account entry of a batch
#[derive(Debug, Clone, Deserialize)]
pub struct BatchAccount {
    /// Account id
    pub id: AccountId,
    /// Display name
    #[serde(default)]
    pub full_name: Option<String>,
    /// Preferred email
    #[serde(default)]
    pub preferred_email: Option<String>,
}

/// Submitted change of a batch
#[derive(Debug, Clone, Deserialize)]
pub struct BatchChange {
    /// Change number
    pub id: ChangeId,
    /// Current patch set number
    pub patch_set: u32,
    /// Commit of the current patch set
    pub commit: CommitId,
    /// Account that submitted the change
    pub submitter: AccountId,
    /// Submission time (defaults to load time)
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
    /// Messages already on the change, any order
    #[serde(default)]
    pub messages: Vec<BatchMessage>,
}

/// Existing change message of a batch
#[derive(Debug, Clone, Deserialize)]
pub struct BatchMessage {
    /// Author; messages without one count as server-written
    #[serde(default)]
    pub author: Option<AccountId>,
    /// When it was written
    pub written_on: DateTime<Utc>,
    /// Body
    pub message: String,
}

impl Batch {
    /// Load a batch from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Parse(format!("failed to read {}: {e}", path.display())))?;
        Self::parse(&content)
            .map_err(|e| Error::Parse(format!("failed to parse {}: {e}", path.display())))
    }

    /// Parse a batch from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        let batch: Self = toml::from_str(content).map_err(|e| Error::Parse(e.to_string()))?;
        if batch.project.trim().is_empty() {
            return Err(Error::Parse("batch has no project".to_string()));
        }
        Ok(batch)
    }

    /// Destination branch
    pub fn branch_ref(&self) -> BranchRef {
        BranchRef::new(&self.project, &self.branch)
    }

    /// Review store seeded with this batch's records
    pub fn to_store(&self) -> InMemoryReviewStore {
        let store = InMemoryReviewStore::new();
        let now = Utc::now();

        for account in &self.accounts {
            store.add_account(Account {
                id: account.id,
                full_name: account.full_name.clone(),
                preferred_email: account.preferred_email.clone(),
            });
        }

        for change in &self.changes {
            let patch_set = PatchSetId {
                change: change.id,
                number: change.patch_set,
            };
            store.add_approval(SubmitApproval {
                patch_set,
                account: change.submitter,
                granted: change.submitted_at.unwrap_or(now),
            });
            for (idx, message) in change.messages.iter().enumerate() {
                store.add_message(ChangeMessage {
                    key: MessageKey {
                        change: change.id,
                        uuid: format!("batch-{}-{idx}", change.id),
                    },
                    author: message.author,
                    patch_set: Some(patch_set),
                    written_on: message.written_on,
                    message: message.message.clone(),
                });
            }
        }

        store
    }

    /// Load the submitted commits from `graph`, in submission order
    pub fn pending(&self, graph: &dyn CommitGraph) -> Result<Vec<TrackedCommit>> {
        self.changes
            .iter()
            .map(|change| {
                let commit = graph.parse_commit(&change.commit)?;
                Ok(TrackedCommit::for_patch_set(
                    commit.id,
                    commit.parents,
                    commit.message,
                    PatchSetId {
                        change: change.id,
                        number: change.patch_set,
                    },
                ))
            })
            .collect()
    }
}
