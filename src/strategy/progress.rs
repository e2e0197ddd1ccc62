//! Progress callback trait for interface-agnostic updates
//!
//! The engine reports what it is doing through an injected
//! [`SubmitProgress`] instead of writing to a terminal or global logger.

use crate::outcome::Outcome;
use crate::sync::HookResult;
use crate::types::CommitId;
use async_trait::async_trait;

/// Strategy run phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Dropping merged, blocked and redundant candidates
    Reducing,
    /// Choosing the fast-forward target
    Selecting,
    /// Running the policy's integration step
    Integrating,
    /// Recording what landed
    MarkingClean,
    /// Run complete
    Complete,
}

/// Progress callback trait
///
/// Implement this trait to receive progress updates during a submission.
/// - CLI implementations can print to terminal
/// - Services can forward events to their own reporting
#[async_trait]
pub trait SubmitProgress: Send + Sync {
    /// Called when entering a new phase
    async fn on_phase(&self, phase: Phase);

    /// Called when a commit receives its final outcome
    async fn on_outcome(&self, commit: &CommitId, outcome: Outcome);

    /// Called before the external sync hook runs for `commit`
    async fn on_hook_started(&self, commit: &CommitId, ticket: &str);

    /// Called after the hook returned (`None` if it could not run)
    async fn on_hook_finished(&self, commit: &CommitId, result: Option<&HookResult>);

    /// Called for every message written to a change's audit trail
    async fn on_message(&self, commit: &CommitId, message: &str);
}

/// No-op progress callback for testing or when progress isn't needed
pub struct NoopProgress;

#[async_trait]
impl SubmitProgress for NoopProgress {
    async fn on_phase(&self, _phase: Phase) {}
    async fn on_outcome(&self, _commit: &CommitId, _outcome: Outcome) {}
    async fn on_hook_started(&self, _commit: &CommitId, _ticket: &str) {}
    async fn on_hook_finished(&self, _commit: &CommitId, _result: Option<&HookResult>) {}
    async fn on_message(&self, _commit: &CommitId, _message: &str) {}
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Reducing => "Reducing batch",
            Self::Selecting => "Selecting fast-forward",
            Self::Integrating => "Integrating",
            Self::MarkingClean => "Marking merged commits",
            Self::Complete => "Done",
        };
        f.write_str(label)
    }
}
