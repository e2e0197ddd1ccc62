//! Integration step that mirrors every commit to the external system
//!
//! Commits between the old and new tip are pushed one by one, oldest
//! first. The tip only advances past a commit once the hook accepted it;
//! the first failure halts the sequence and blocks everything after it.

use super::SubmitArgs;
use super::engine::Session;
use super::ticket::TicketMatcher;
use crate::commit::TrackedCommit;
use crate::credentials::CredentialStore;
use crate::graph::{Reduction, RevSort, RevWalk};
use crate::outcome::Outcome;
use crate::sync::{HookRequest, SyncHook};
use crate::types::{Account, CommitId, R_HEADS};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Message recorded when the hook returned nothing
pub const HOOK_NOT_RUN_MESSAGE: &str = "Could not run external sync hook.";

/// Whether commits landing on `ref_name` are mirrored.
///
/// Only top-level branches are: `refs/heads/main` is, `refs/heads/team/main`
/// and anything outside `refs/heads/` are not.
pub fn is_syncable_branch(ref_name: &str) -> bool {
    ref_name
        .strip_prefix(R_HEADS)
        .is_some_and(|branch| !branch.is_empty() && !branch.contains('/'))
}

/// Collaborators of the external sync policy
#[derive(Clone)]
pub struct ExternalSync {
    credentials: Arc<dyn CredentialStore>,
    hook: Arc<dyn SyncHook>,
    tickets: TicketMatcher,
}

impl fmt::Debug for ExternalSync {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExternalSync")
            .field("ticket_pattern", &self.tickets.as_str())
            .finish_non_exhaustive()
    }
}

enum Step {
    Pushed,
    Failed(Outcome),
}

impl ExternalSync {
    /// Sync through `hook`, resolving submitters via `credentials`
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        hook: Arc<dyn SyncHook>,
        tickets: TicketMatcher,
    ) -> Self {
        Self {
            credentials,
            hook,
            tickets,
        }
    }

    /// Push every commit between `old_tip` and `new_tip`, returning the last
    /// one the mirror accepted.
    pub(super) async fn integrate(
        &self,
        args: &SubmitArgs<'_>,
        session: &mut Session<'_>,
        reduction: &Reduction,
        old_tip: &TrackedCommit,
        new_tip: TrackedCommit,
    ) -> TrackedCommit {
        if new_tip.id == old_tip.id {
            return new_tip;
        }
        if !is_syncable_branch(&args.branch.name) {
            info!(branch = %args.branch, "branch is not mirrored, skipping external sync");
            return new_tip;
        }

        // Batch commits this sequence is expected to cover.
        let in_range: Vec<CommitId> = session
            .order
            .iter()
            .filter(|id| **id == new_tip.id || reduction.folded.get(*id) == Some(&new_tip.id))
            .cloned()
            .collect();

        let mut synced: HashSet<CommitId> = HashSet::new();
        let mut current = old_tip.clone();

        let mut walk = RevWalk::new(args.graph);
        walk.mark_start(&new_tip.id)
            .mark_uninteresting(&old_tip.id)
            .sort(RevSort::TopoReverse);

        loop {
            let next = match walk.next() {
                Ok(Some(next)) => next,
                Ok(None) => break,
                Err(e) => {
                    error!(branch = %args.branch, error = %e, "revision walk failed during external sync");
                    let rest = unresolved(session, &walk.remaining(), &in_range, &synced);
                    for id in rest {
                        session.finalize(&id, Outcome::InternalError);
                    }
                    session.flush().await;
                    break;
                }
            };

            let Some(commit) = session.batch.get(&next.id).cloned() else {
                error!(commit = %next.id, "commit between tips is not part of the submission");
                let rest = unresolved(session, &walk.remaining(), &in_range, &synced);
                for id in rest {
                    session.finalize(&id, Outcome::InternalError);
                }
                session.flush().await;
                break;
            };

            match self.push(args, session, &current, &commit).await {
                Step::Pushed => {
                    synced.insert(commit.id.clone());
                    current = commit;
                }
                Step::Failed(outcome) => {
                    warn!(commit = %commit.id, %outcome, "external sync halted");
                    session.finalize(&commit.id, outcome);
                    let rest = unresolved(session, &walk.remaining(), &in_range, &synced);
                    for id in rest {
                        session.finalize(&id, Outcome::DependencyBlocked);
                    }
                    session.flush().await;
                    break;
                }
            }
        }

        current
    }

    async fn push(
        &self,
        args: &SubmitArgs<'_>,
        session: &Session<'_>,
        current: &TrackedCommit,
        commit: &TrackedCommit,
    ) -> Step {
        let Some(patch_set) = commit.patch_set else {
            warn!(commit = %commit.id, "commit has no patch set");
            return Step::Failed(Outcome::NoPatchSet);
        };

        let approval = match args.store.submitter_of(patch_set).await {
            Ok(Some(approval)) => approval,
            Ok(None) => {
                warn!(%patch_set, "no submit approval recorded");
                return Step::Failed(Outcome::NoCredentials);
            }
            Err(e) => {
                warn!(%patch_set, error = %e, "cannot look up submitter");
                return Step::Failed(Outcome::NoCredentials);
            }
        };
        let submitter = approval.account;

        let credentials = match self.credentials.lookup(submitter).await {
            Ok(Some(credentials)) => credentials,
            Ok(None) => {
                debug!(account = %submitter, "submitter has no external credentials");
                return Step::Failed(Outcome::NoCredentials);
            }
            Err(e) => {
                warn!(account = %submitter, error = %e, "cannot look up external credentials");
                return Step::Failed(Outcome::NoCredentials);
            }
        };

        let account = match args.store.account(submitter).await {
            Ok(account) => account.unwrap_or(Account {
                id: submitter,
                full_name: None,
                preferred_email: None,
            }),
            Err(e) => {
                warn!(account = %submitter, error = %e, "cannot look up submitter account");
                return Step::Failed(Outcome::NoCredentials);
            }
        };

        let history = match args.store.messages_by_change(patch_set.change).await {
            Ok(messages) => messages,
            Err(e) => {
                warn!(change = %patch_set.change, error = %e, "cannot read change messages");
                Vec::new()
            }
        };
        let Some(ticket) = self.tickets.extract(&commit.message, &history) else {
            debug!(commit = %commit.id, "no ticket");
            return Step::Failed(Outcome::NoTicket);
        };

        info!(
            commit = %commit.id,
            branch = %args.branch,
            %ticket,
            external_user = %credentials.external_user,
            "integrating commit externally"
        );
        session
            .note(
                commit,
                &format!(
                    "going to integrate commit {} under ticket {ticket} as external user {}",
                    commit.id, credentials.external_user
                ),
            )
            .await;

        let request = HookRequest {
            project: args.branch.project.clone(),
            repo_path: args.graph.path().to_path_buf(),
            change_ref: patch_set.to_ref_name(),
            branch: args.branch.name.clone(),
            ticket: ticket.clone(),
            account,
            external_user: credentials.external_user,
            external_secret: credentials.private_key,
            old_rev: current.id.clone(),
            new_rev: commit.id.clone(),
        };
        if let Err(e) = request.validate() {
            warn!(commit = %commit.id, error = %e, "refusing to run hook");
            session.note(commit, &format!("{HOOK_NOT_RUN_MESSAGE}\n{e}")).await;
            return Step::Failed(Outcome::ExternalSyncFailed);
        }

        args.progress.on_hook_started(&commit.id, &ticket).await;
        let result = self.hook.invoke(&request).await;
        args.progress
            .on_hook_finished(&commit.id, result.as_ref())
            .await;

        let Some(result) = result else {
            session.note(commit, HOOK_NOT_RUN_MESSAGE).await;
            return Step::Failed(Outcome::ExternalSyncFailed);
        };

        let output = result.output.trim();
        if !result.is_success() {
            session
                .note(
                    commit,
                    &format!("{output}\nexternal-sync rc: {}", result.exit_code),
                )
                .await;
            return Step::Failed(Outcome::ExternalSyncFailed);
        }

        if !output.is_empty() {
            session.note(commit, output).await;
        }
        Step::Pushed
    }
}

/// Commits of the halted sequence that still need an outcome, batch order
fn unresolved(
    session: &Session<'_>,
    remaining: &[CommitId],
    in_range: &[CommitId],
    synced: &HashSet<CommitId>,
) -> Vec<CommitId> {
    let candidates: HashSet<&CommitId> = remaining.iter().chain(in_range).collect();
    session
        .order
        .iter()
        .filter(|id| candidates.contains(id) && !synced.contains(*id) && !session.is_final(id))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_level_branches_sync() {
        assert!(is_syncable_branch("refs/heads/main"));
        assert!(is_syncable_branch("refs/heads/release-2.1"));
    }

    #[test]
    fn test_nested_and_foreign_refs_skip() {
        assert!(!is_syncable_branch("refs/heads/team/main"));
        assert!(!is_syncable_branch("refs/meta/config"));
        assert!(!is_syncable_branch("main"));
        assert!(!is_syncable_branch("refs/heads/"));
    }
}
