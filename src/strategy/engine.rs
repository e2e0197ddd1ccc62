//! Shared fast-forward algorithm
//!
//! reduce -> select -> reject stragglers -> integrate -> mark clean -> resolve leftovers

use super::messages::AuditTrail;
use super::progress::{Phase, SubmitProgress};
use super::{Policy, SubmitResult, SubmitStrategy};
use crate::commit::{PendingSet, TrackedCommit};
use crate::error::Result;
use crate::graph::{MergeUtil, Reduction};
use crate::outcome::{Outcome, OutcomeMap};
use crate::store::ReviewStore;
use crate::types::CommitId;
use std::collections::HashMap;
use tracing::{debug, error, info};

/// Per-run bookkeeping: the original batch, the outcomes so far and how many
/// of them have been reported.
pub(super) struct Session<'a> {
    pub(super) batch: HashMap<CommitId, TrackedCommit>,
    pub(super) order: Vec<CommitId>,
    pub(super) outcomes: OutcomeMap,
    trail: AuditTrail<'a>,
    progress: &'a dyn SubmitProgress,
    reported: usize,
}

impl<'a> Session<'a> {
    fn new(
        store: &'a dyn ReviewStore,
        progress: &'a dyn SubmitProgress,
        pending: &PendingSet,
    ) -> Self {
        Self {
            batch: pending
                .commits()
                .iter()
                .map(|c| (c.id.clone(), c.clone()))
                .collect(),
            order: pending.commits().iter().map(|c| c.id.clone()).collect(),
            outcomes: OutcomeMap::new(),
            trail: AuditTrail::new(store, progress),
            progress,
            reported: 0,
        }
    }

    pub(super) fn finalize(&mut self, id: &CommitId, outcome: Outcome) -> bool {
        self.outcomes.finalize(id, outcome)
    }

    pub(super) fn is_final(&self, id: &CommitId) -> bool {
        self.outcomes.is_final(id)
    }

    /// Write an informational message on `commit`'s change
    pub(super) async fn note(&self, commit: &TrackedCommit, text: &str) {
        self.trail.append(commit, text).await;
    }

    /// Report and record every outcome finalized since the last flush
    pub(super) async fn flush(&mut self) {
        let fresh: Vec<(CommitId, Outcome)> = self
            .outcomes
            .iter()
            .skip(self.reported)
            .map(|(id, outcome)| (id.clone(), outcome))
            .collect();
        self.reported = self.outcomes.len();

        for (id, outcome) in fresh {
            debug!(commit = %id, %outcome, "outcome recorded");
            self.progress.on_outcome(&id, outcome).await;
            if let Some(commit) = self.batch.get(&id) {
                self.trail.append(commit, outcome.message()).await;
            }
        }
    }

    /// Give every commit still without an outcome one
    fn resolve_leftovers(&mut self, reduction: &Reduction) {
        let unresolved: Vec<CommitId> = self
            .order
            .iter()
            .filter(|id| !self.outcomes.is_final(id))
            .cloned()
            .collect();

        for id in unresolved {
            if let Some(head) = reduction.folded.get(&id) {
                debug!(commit = %id, %head, "covering commit was not accepted");
                self.finalize(&id, Outcome::DependencyBlocked);
            } else {
                error!(commit = %id, "no outcome recorded for commit");
                self.finalize(&id, Outcome::InternalError);
            }
        }
    }
}

impl SubmitStrategy<'_> {
    /// Integrate `pending` onto `merge_tip`.
    ///
    /// Every pending commit ends up with an outcome or reachable from the
    /// returned tip. Business failures are outcomes; only graph and store
    /// faults hit before anything was integrated, or while marking what
    /// landed, are returned as errors.
    pub async fn run(
        &self,
        merge_tip: &TrackedCommit,
        pending: &mut PendingSet,
    ) -> Result<SubmitResult> {
        let args = &self.args;
        let util = MergeUtil::new(args.graph, args.store);
        let mut session = Session::new(args.store, args.progress, pending);

        info!(
            branch = %args.branch,
            tip = %merge_tip.id,
            pending = pending.len(),
            policy = self.policy.name(),
            "submitting"
        );

        args.progress.on_phase(Phase::Reducing).await;
        let reduction =
            util.reduce_to_minimal_merge(&merge_tip.id, pending, &mut session.outcomes)?;

        args.progress.on_phase(Phase::Selecting).await;
        let selected = util.first_fast_forward(merge_tip, pending)?;
        for straggler in pending.drain() {
            debug!(commit = %straggler.id, "not a fast-forward of {}", selected.id.short());
            session.finalize(&straggler.id, Outcome::NotFastForward);
        }
        session.flush().await;

        args.progress.on_phase(Phase::Integrating).await;
        let accepted = match &self.policy {
            Policy::LocalOnly => selected,
            Policy::WithExternalSync(sync) => {
                sync.integrate(args, &mut session, &reduction, merge_tip, selected)
                    .await
            }
        };

        args.progress.on_phase(Phase::MarkingClean).await;
        let mut already_accepted = args.already_accepted.clone();
        already_accepted.push(merge_tip.id.clone());
        let submit_approval = util
            .mark_clean_merges(
                &accepted.id,
                &already_accepted,
                &session.batch,
                &mut session.outcomes,
            )
            .await?;
        session.resolve_leftovers(&reduction);
        session.flush().await;

        args.progress.on_phase(Phase::Complete).await;
        info!(
            branch = %args.branch,
            old = %merge_tip.id,
            new = %accepted.id,
            finalized = session.outcomes.len(),
            "submission computed"
        );

        Ok(SubmitResult {
            new_tip: accepted,
            outcomes: session.outcomes,
            submit_approval,
        })
    }

    /// Whether `candidate` would land on `merge_tip` as a fast-forward.
    ///
    /// Reads the graph only.
    pub fn dry_run(&self, merge_tip: &TrackedCommit, candidate: &TrackedCommit) -> Result<bool> {
        MergeUtil::new(self.args.graph, self.args.store)
            .can_fast_forward(&merge_tip.id, &candidate.id)
    }
}
