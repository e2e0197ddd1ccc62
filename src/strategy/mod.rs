//! Submit strategies
//!
//! A [`SubmitStrategy`] integrates one approved batch onto a destination
//! branch by fast-forward. The [`Policy`] decides what happens between
//! choosing the new tip and recording what landed: nothing for
//! [`Policy::LocalOnly`], a per-commit push to the external mirror for
//! [`Policy::WithExternalSync`].

mod engine;
mod external_sync;
mod messages;
mod progress;
mod ticket;

pub use external_sync::{ExternalSync, HOOK_NOT_RUN_MESSAGE, is_syncable_branch};
pub use progress::{NoopProgress, Phase, SubmitProgress};
pub use ticket::{DEFAULT_TICKET_PATTERN, TicketMatcher};

use crate::commit::{PendingSet, TrackedCommit};
use crate::config::{SubmitConfig, SubmitType};
use crate::credentials::FileCredentialStore;
use crate::error::{Error, Result};
use crate::graph::{CommitGraph, RefUpdateStatus, RefUpdater};
use crate::outcome::OutcomeMap;
use crate::store::ReviewStore;
use crate::sync::CommandHook;
use crate::types::{BranchRef, CommitId, SubmitApproval};
use std::sync::Arc;
use tracing::{info, warn};

/// How commits are integrated once the fast-forward target is known
#[derive(Debug, Clone)]
pub enum Policy {
    /// Move the branch, nothing else
    LocalOnly,
    /// Push every commit to the external mirror before the branch may move past it
    WithExternalSync(ExternalSync),
}

impl Policy {
    /// Policy configured for `project`
    pub fn from_config(config: &SubmitConfig, project: &str) -> Result<Self> {
        match config.submit_type(project) {
            SubmitType::FastForwardOnly => Ok(Self::LocalOnly),
            SubmitType::FastForwardWithExternalSync => {
                let hook = config.hook.external_sync.as_ref().ok_or_else(|| {
                    Error::Config(format!(
                        "project {project} requires external sync but no [hook] external_sync is set"
                    ))
                })?;
                let path = config.credentials_path().ok_or_else(|| {
                    Error::Config("no [credentials] path and no config directory".to_string())
                })?;
                let credentials = FileCredentialStore::load(&path)?;
                Ok(Self::WithExternalSync(ExternalSync::new(
                    Arc::new(credentials),
                    Arc::new(CommandHook::new(hook)),
                    config.tickets()?,
                )))
            }
        }
    }

    /// Short name for logs
    pub const fn name(&self) -> &'static str {
        match self {
            Self::LocalOnly => "fast-forward-only",
            Self::WithExternalSync(_) => "fast-forward-with-external-sync",
        }
    }
}

/// Collaborators of one strategy run
pub struct SubmitArgs<'a> {
    /// Destination branch
    pub branch: BranchRef,
    /// Repository history
    pub graph: &'a dyn CommitGraph,
    /// Change records
    pub store: &'a dyn ReviewStore,
    /// Progress reporter
    pub progress: &'a dyn SubmitProgress,
    /// Commits already accepted on the branch besides the merge tip
    pub already_accepted: Vec<CommitId>,
}

impl<'a> SubmitArgs<'a> {
    /// Arguments with no progress reporting
    pub fn new(branch: BranchRef, graph: &'a dyn CommitGraph, store: &'a dyn ReviewStore) -> Self {
        Self {
            branch,
            graph,
            store,
            progress: &NoopProgress,
            already_accepted: Vec::new(),
        }
    }

    /// Report progress to `progress`
    #[must_use]
    pub fn with_progress(mut self, progress: &'a dyn SubmitProgress) -> Self {
        self.progress = progress;
        self
    }

    /// Treat `accepted` as already on the branch
    #[must_use]
    pub fn with_already_accepted(mut self, accepted: Vec<CommitId>) -> Self {
        self.already_accepted = accepted;
        self
    }
}

/// What a strategy run produced
#[derive(Debug, Clone)]
pub struct SubmitResult {
    /// Tip the branch should move to (the old tip if nothing landed)
    pub new_tip: TrackedCommit,
    /// Outcome of every finalized commit
    pub outcomes: OutcomeMap,
    /// Approval the ref update is attributed to
    pub submit_approval: Option<SubmitApproval>,
}

/// Fast-forward submit strategy
pub struct SubmitStrategy<'a> {
    args: SubmitArgs<'a>,
    policy: Policy,
}

impl<'a> SubmitStrategy<'a> {
    /// Strategy integrating with `policy`
    pub fn new(args: SubmitArgs<'a>, policy: Policy) -> Self {
        Self { args, policy }
    }

    /// Destination branch
    pub const fn branch(&self) -> &BranchRef {
        &self.args.branch
    }

    /// Integration policy
    pub const fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Whether a lost race on the destination ref may be retried by rerunning
    /// the submission. Always `false` for fast-forward strategies.
    pub const fn retry_on_lock_failure(&self) -> bool {
        false
    }
}

/// Run `strategy` and move the destination ref to the new tip
pub async fn integrate(
    strategy: &SubmitStrategy<'_>,
    refs: &dyn RefUpdater,
    merge_tip: &TrackedCommit,
    pending: &mut PendingSet,
) -> Result<SubmitResult> {
    let result = strategy.run(merge_tip, pending).await?;
    if result.new_tip.id == merge_tip.id {
        info!(branch = %strategy.branch(), "nothing to integrate");
        return Ok(result);
    }

    let branch = &strategy.branch().name;
    match refs.compare_and_swap(branch, Some(&merge_tip.id), &result.new_tip.id)? {
        RefUpdateStatus::Updated => {
            info!(
                %branch,
                old = %merge_tip.id,
                new = %result.new_tip.id,
                by = ?result.submit_approval.as_ref().map(|a| a.account),
                "branch updated"
            );
            Ok(result)
        }
        RefUpdateStatus::LockFailure { actual } => {
            warn!(%branch, expected = %merge_tip.id, "destination moved during submission");
            Err(Error::LockFailure {
                branch: branch.clone(),
                expected: merge_tip.id.clone(),
                actual: actual.map_or_else(|| "<none>".to_string(), |id| id.to_string()),
                retryable: strategy.retry_on_lock_failure(),
            })
        }
    }
}
