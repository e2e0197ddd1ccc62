//! Terminal submission outcomes
//!
//! Every commit a strategy attempts ends with exactly one [`Outcome`]. The
//! reviewer-facing text comes from here so it never depends on which
//! policy produced it.

use crate::types::CommitId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::warn;

/// Terminal result of one commit in a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Outcome {
    /// Merged into the destination branch
    CleanMerge,
    /// Cherry-picked onto the destination branch
    CleanPick,
    /// Rebased onto the destination branch
    CleanRebase,
    /// Already reachable from the destination branch
    AlreadyMerged,
    /// Content conflict on a path
    PathConflict,
    /// Depends on a commit that is neither merged nor submitted
    MissingDependency,
    /// Patch set record is missing
    NoPatchSet,
    /// Revision no longer exists
    RevisionGone,
    /// Project has no submit type configured
    NoSubmitType,
    /// Needs a manual recursive merge
    ManualRecursiveMerge,
    /// Root commits cannot be cherry-picked
    CannotCherryPickRoot,
    /// Root commits cannot be rebased
    CannotRebaseRoot,
    /// Does not fast-forward the destination branch
    NotFastForward,
    /// Submitter has no external sync credentials
    NoCredentials,
    /// No routing ticket in commit message or change messages
    NoTicket,
    /// External sync hook failed or could not run
    ExternalSyncFailed,
    /// An earlier commit of the same sync sequence was not integrated
    DependencyBlocked,
    /// Invalid project configuration
    InvalidProjectConfiguration,
    /// Project configuration names a parent that does not exist
    InvalidProjectConfigurationParentNotFound,
    /// Root project configuration names a parent
    InvalidProjectConfigurationRootCannotHaveParent,
    /// Parent change requires an administrator
    SettingParentProjectOnlyAllowedByAdmin,
    /// Graph data could not be read while processing this commit
    InternalError,
}

impl Outcome {
    /// Reviewer-facing explanation
    #[allow(clippy::too_many_lines)]
    pub const fn message(self) -> &'static str {
        match self {
            Self::CleanMerge => "Change has been successfully merged into the git repository.",
            Self::CleanPick => "Change has been successfully cherry-picked",
            Self::CleanRebase => "Change has been successfully rebased",
            Self::AlreadyMerged => "Change is already part of the destination branch.",
            Self::PathConflict => {
                "The change could not be merged due to a path conflict.\n\
                 \n\
                 Please rebase the change locally and upload the rebased commit for review."
            }
            Self::MissingDependency => {
                "The change depends on a commit that is neither merged nor submitted."
            }
            Self::NoPatchSet => "The change has no patch set for the submitted commit.",
            Self::RevisionGone => "The submitted revision no longer exists.",
            Self::NoSubmitType => "The project has no submit type configured.",
            Self::ManualRecursiveMerge => {
                "The change requires a local merge to resolve.\n\
                 \n\
                 Please merge (or rebase) the change locally and upload the resolution for review."
            }
            Self::CannotCherryPickRoot => {
                "Cannot cherry-pick an initial commit onto an existing branch.\n\
                 \n\
                 Please merge the change locally and upload the merge commit for review."
            }
            Self::CannotRebaseRoot => {
                "Cannot rebase an initial commit onto an existing branch.\n\
                 \n\
                 Please merge the change locally and upload the merge commit for review."
            }
            Self::NotFastForward => {
                "Project policy requires all submissions to be a fast-forward.\n\
                 \n\
                 Please rebase the change locally and upload again for review."
            }
            Self::NoCredentials => {
                "Target branch is strictly following the external repository branch with the same name.\n\
                 When you submit changes to this branch they are also committed to the external repository.\n\
                 Submitter should configure external username and private key in the account settings."
            }
            Self::NoTicket => {
                "Cannot merge the change, because no ticket was specified.\n\
                 Please add change comment with ticket number in format 'TICKET: <ticket number>' \
                 or add it in commit message."
            }
            Self::ExternalSyncFailed => {
                "Could not merge the change to the external repository. \
                 See previous change message for details."
            }
            Self::DependencyBlocked => {
                "An earlier change in the same submission could not be integrated; \
                 this change was not merged."
            }
            Self::InvalidProjectConfiguration => {
                "Change contains an invalid project configuration."
            }
            Self::InvalidProjectConfigurationParentNotFound => {
                "Change contains an invalid project configuration:\n\
                 Parent project does not exist."
            }
            Self::InvalidProjectConfigurationRootCannotHaveParent => {
                "Change contains an invalid project configuration:\n\
                 The root project cannot have a parent."
            }
            Self::SettingParentProjectOnlyAllowedByAdmin => {
                "Change contains a project configuration that changes the parent project.\n\
                 The change must be submitted by an administrator."
            }
            Self::InternalError => {
                "The change could not be processed because of an internal error. \
                 Please contact an administrator."
            }
        }
    }

    /// Whether the commit ended up on the destination branch
    pub const fn is_success(self) -> bool {
        matches!(
            self,
            Self::CleanMerge | Self::CleanPick | Self::CleanRebase | Self::AlreadyMerged
        )
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Self::CleanMerge => "clean-merge",
            Self::CleanPick => "clean-pick",
            Self::CleanRebase => "clean-rebase",
            Self::AlreadyMerged => "already-merged",
            Self::PathConflict => "path-conflict",
            Self::MissingDependency => "missing-dependency",
            Self::NoPatchSet => "no-patch-set",
            Self::RevisionGone => "revision-gone",
            Self::NoSubmitType => "no-submit-type",
            Self::ManualRecursiveMerge => "manual-recursive-merge",
            Self::CannotCherryPickRoot => "cannot-cherry-pick-root",
            Self::CannotRebaseRoot => "cannot-rebase-root",
            Self::NotFastForward => "not-fast-forward",
            Self::NoCredentials => "no-credentials",
            Self::NoTicket => "no-ticket",
            Self::ExternalSyncFailed => "external-sync-failed",
            Self::DependencyBlocked => "dependency-blocked",
            Self::InvalidProjectConfiguration => "invalid-project-configuration",
            Self::InvalidProjectConfigurationParentNotFound => {
                "invalid-project-configuration-parent-not-found"
            }
            Self::InvalidProjectConfigurationRootCannotHaveParent => {
                "invalid-project-configuration-root-cannot-have-parent"
            }
            Self::SettingParentProjectOnlyAllowedByAdmin => {
                "setting-parent-project-only-allowed-by-admin"
            }
            Self::InternalError => "internal-error",
        };
        f.write_str(tag)
    }
}

/// Outcomes of one strategy run, keyed by commit identity.
///
/// Entries are write-once: a second assignment for the same commit is
/// ignored and logged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutcomeMap {
    outcomes: HashMap<CommitId, Outcome>,
    order: Vec<CommitId>,
}

impl OutcomeMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of `commit`. Returns `false` if it was already final.
    pub fn finalize(&mut self, commit: &CommitId, outcome: Outcome) -> bool {
        if let Some(existing) = self.outcomes.get(commit) {
            warn!(
                commit = %commit,
                %existing,
                rejected = %outcome,
                "outcome already recorded"
            );
            return false;
        }
        self.outcomes.insert(commit.clone(), outcome);
        self.order.push(commit.clone());
        true
    }

    /// Outcome of `commit`, if final
    pub fn get(&self, commit: &CommitId) -> Option<Outcome> {
        self.outcomes.get(commit).copied()
    }

    /// Whether `commit` has an outcome
    pub fn is_final(&self, commit: &CommitId) -> bool {
        self.outcomes.contains_key(commit)
    }

    /// Number of finalized commits
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether nothing was finalized
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Outcomes in the order they were recorded
    pub fn iter(&self) -> impl Iterator<Item = (&CommitId, Outcome)> {
        self.order.iter().map(|id| (id, self.outcomes[id]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(c: char) -> CommitId {
        CommitId::new(c.to_string().repeat(40))
    }

    #[test]
    fn test_finalize_is_write_once() {
        let mut map = OutcomeMap::new();
        assert!(map.finalize(&id('a'), Outcome::NotFastForward));
        assert!(!map.finalize(&id('a'), Outcome::CleanMerge));
        assert_eq!(map.get(&id('a')), Some(Outcome::NotFastForward));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_iter_keeps_recording_order() {
        let mut map = OutcomeMap::new();
        map.finalize(&id('c'), Outcome::CleanMerge);
        map.finalize(&id('a'), Outcome::NoTicket);
        map.finalize(&id('b'), Outcome::DependencyBlocked);

        let order: Vec<_> = map.iter().map(|(c, _)| c.clone()).collect();
        assert_eq!(order, vec![id('c'), id('a'), id('b')]);
    }

    #[test]
    fn test_success_outcomes() {
        assert!(Outcome::CleanMerge.is_success());
        assert!(Outcome::AlreadyMerged.is_success());
        assert!(!Outcome::NotFastForward.is_success());
        assert!(!Outcome::ExternalSyncFailed.is_success());
    }

    #[test]
    fn test_display_matches_serde_tag() {
        for outcome in [
            Outcome::CleanMerge,
            Outcome::NotFastForward,
            Outcome::NoCredentials,
            Outcome::ExternalSyncFailed,
            Outcome::InternalError,
        ] {
            let json = serde_json::to_string(&outcome).unwrap();
            assert_eq!(json, format!("\"{outcome}\""));
        }
    }

    #[test]
    fn test_no_ticket_message_explains_format() {
        assert!(Outcome::NoTicket.message().contains("TICKET: <ticket number>"));
    }
}
