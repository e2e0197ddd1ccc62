//! Graph reduction for fast-forward submissions
//!
//! Shrinks a batch to the commits that actually have to move the branch,
//! picks the fast-forward target and marks what landed.

use super::{CommitGraph, RevSort, RevWalk};
use crate::commit::{PendingSet, TrackedCommit};
use crate::error::Result;
use crate::outcome::{Outcome, OutcomeMap};
use crate::store::ReviewStore;
use crate::types::{CommitId, PatchSetId, SubmitApproval};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// What minimal-merge reduction did to a batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reduction {
    /// Commits folded into a descendant that is still pending: folded -> covering head
    pub folded: HashMap<CommitId, CommitId>,
}

/// Graph-reduction helpers bound to one repository and record store
pub struct MergeUtil<'a> {
    graph: &'a dyn CommitGraph,
    store: &'a dyn ReviewStore,
}

impl<'a> MergeUtil<'a> {
    /// Bind helpers to a graph and store
    pub fn new(graph: &'a dyn CommitGraph, store: &'a dyn ReviewStore) -> Self {
        Self { graph, store }
    }

    /// Reduce `pending` to the heads that must be merged.
    ///
    /// Commits already reachable from `tip` are finalized `already-merged`;
    /// commits needing an ancestor outside both the branch and the batch are
    /// finalized `missing-dependency`; commits that are ancestors of another
    /// surviving commit are folded into it and leave the set unfinalized.
    pub fn reduce_to_minimal_merge(
        &self,
        tip: &CommitId,
        pending: &mut PendingSet,
        outcomes: &mut OutcomeMap,
    ) -> Result<Reduction> {
        let batch: HashSet<CommitId> = pending.commits().iter().map(|c| c.id.clone()).collect();

        let mut merged = Vec::new();
        for commit in pending.commits() {
            if self.graph.is_ancestor(&commit.id, tip)? {
                merged.push(commit.id.clone());
            }
        }
        for id in &merged {
            pending.take(id);
            outcomes.finalize(id, Outcome::AlreadyMerged);
            debug!(commit = %id, "already merged");
        }

        let mut missing = Vec::new();
        for commit in pending.commits() {
            let mut walk = RevWalk::new(self.graph);
            walk.mark_start(&commit.id).mark_uninteresting(tip);
            while let Some(ancestor) = walk.next()? {
                if !batch.contains(&ancestor.id) {
                    debug!(
                        commit = %commit.id,
                        dependency = %ancestor.id,
                        "missing dependency"
                    );
                    missing.push(commit.id.clone());
                    break;
                }
            }
        }
        for id in &missing {
            pending.take(id);
            outcomes.finalize(id, Outcome::MissingDependency);
        }

        let mut reduction = Reduction::default();
        let candidates: Vec<CommitId> = pending.commits().iter().map(|c| c.id.clone()).collect();
        for id in &candidates {
            for other in &candidates {
                if other != id
                    && !reduction.folded.contains_key(other)
                    && self.graph.is_ancestor(id, other)?
                {
                    reduction.folded.insert(id.clone(), other.clone());
                    break;
                }
            }
        }
        // Re-point chains (a folded into b folded into c) at the final head.
        let heads: HashMap<CommitId, CommitId> = reduction
            .folded
            .keys()
            .map(|id| {
                let mut head = &reduction.folded[id];
                while let Some(next) = reduction.folded.get(head) {
                    head = next;
                }
                (id.clone(), head.clone())
            })
            .collect();
        reduction.folded = heads;
        pending.extract_if(|c| reduction.folded.contains_key(&c.id));

        Ok(reduction)
    }

    /// Remove and return the first pending commit that `tip` fast-forwards to.
    ///
    /// Returns `tip` itself when nothing fast-forwards.
    pub fn first_fast_forward(
        &self,
        tip: &TrackedCommit,
        pending: &mut PendingSet,
    ) -> Result<TrackedCommit> {
        let mut found = None;
        for commit in pending.commits() {
            if self.graph.is_ancestor(&tip.id, &commit.id)? {
                found = Some(commit.id.clone());
                break;
            }
        }
        Ok(found
            .and_then(|id| pending.take(&id))
            .unwrap_or_else(|| tip.clone()))
    }

    /// Whether `candidate` would land on `tip` as a fast-forward
    pub fn can_fast_forward(&self, tip: &CommitId, candidate: &CommitId) -> Result<bool> {
        self.graph.is_ancestor(tip, candidate)
    }

    /// Submit approval recorded on `patch_set`
    pub async fn submitter_of(&self, patch_set: PatchSetId) -> Result<Option<SubmitApproval>> {
        self.store.submitter_of(patch_set).await
    }

    /// Finalize every unresolved batch commit between `already_accepted` and
    /// `new_tip` as `clean-merge`, oldest first.
    ///
    /// Returns the submit approval of the oldest commit marked, which is the
    /// identity the ref update is attributed to. A failed approval lookup is
    /// logged and the next marked commit is tried.
    pub async fn mark_clean_merges(
        &self,
        new_tip: &CommitId,
        already_accepted: &[CommitId],
        batch: &HashMap<CommitId, TrackedCommit>,
        outcomes: &mut OutcomeMap,
    ) -> Result<Option<SubmitApproval>> {
        let landed: Vec<CommitId> = {
            let mut walk = RevWalk::new(self.graph);
            walk.mark_start(new_tip).sort(RevSort::TopoReverse);
            for accepted in already_accepted {
                walk.mark_uninteresting(accepted);
            }
            walk.collect_all()?.into_iter().map(|c| c.id).collect()
        };

        let mut approval = None;
        for id in landed {
            let Some(commit) = batch.get(&id) else {
                continue;
            };
            if outcomes.is_final(&id) {
                continue;
            }
            outcomes.finalize(&id, Outcome::CleanMerge);
            if let (None, Some(patch_set)) = (&approval, commit.patch_set) {
                // The commit has landed either way; only the attribution is lost.
                approval = self.submitter_of(patch_set).await.unwrap_or_else(|e| {
                    warn!(%patch_set, error = %e, "cannot look up submitter of landed commit");
                    None
                });
            }
        }
        Ok(approval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::InMemoryGraph;
    use crate::store::InMemoryReviewStore;

    fn id(c: char) -> CommitId {
        CommitId::new(c.to_string().repeat(40))
    }

    fn tracked(graph: &InMemoryGraph, c: char, change: u32) -> TrackedCommit {
        let commit = graph.parse_commit(&id(c)).unwrap();
        TrackedCommit::for_patch_set(
            commit.id,
            commit.parents,
            commit.message,
            PatchSetId::new(change, 1),
        )
    }

    /// t <- a <- b,  t <- c,  x (outside) <- d
    fn graph() -> InMemoryGraph {
        let g = InMemoryGraph::new("/repo");
        g.add_commit(id('0'), &[], "base");
        g.add_commit(id('t'), &[id('0')], "tip");
        g.add_commit(id('a'), &[id('t')], "a");
        g.add_commit(id('b'), &[id('a')], "b");
        g.add_commit(id('c'), &[id('t')], "c");
        g.add_commit(id('x'), &[id('t')], "x");
        g.add_commit(id('d'), &[id('x')], "d");
        g
    }

    #[test]
    fn test_reduce_folds_ancestors_and_flags_missing() {
        let g = graph();
        let store = InMemoryReviewStore::new();
        let util = MergeUtil::new(&g, &store);
        let mut pending = PendingSet::new(vec![
            tracked(&g, 'a', 1),
            tracked(&g, 'b', 2),
            tracked(&g, 'c', 3),
            tracked(&g, 'd', 4),
            tracked(&g, '0', 5),
        ]);
        let mut outcomes = OutcomeMap::new();

        let reduction = util
            .reduce_to_minimal_merge(&id('t'), &mut pending, &mut outcomes)
            .unwrap();

        let heads: Vec<_> = pending.commits().iter().map(|c| c.id.clone()).collect();
        assert_eq!(heads, vec![id('b'), id('c')]);
        assert_eq!(reduction.folded.get(&id('a')), Some(&id('b')));
        assert_eq!(outcomes.get(&id('d')), Some(Outcome::MissingDependency));
        assert_eq!(outcomes.get(&id('0')), Some(Outcome::AlreadyMerged));
        assert!(!outcomes.is_final(&id('a')));
    }

    #[test]
    fn test_first_fast_forward_takes_first_descendant() {
        let g = graph();
        let store = InMemoryReviewStore::new();
        let util = MergeUtil::new(&g, &store);
        let tip = tracked(&g, 't', 9);
        let mut pending = PendingSet::new(vec![tracked(&g, 'c', 3), tracked(&g, 'b', 2)]);

        let next = util.first_fast_forward(&tip, &mut pending).unwrap();
        assert_eq!(next.id, id('c'));
        assert_eq!(pending.len(), 1);
    }

    #[test]
    fn test_first_fast_forward_without_candidate_keeps_tip() {
        let g = graph();
        let store = InMemoryReviewStore::new();
        let util = MergeUtil::new(&g, &store);
        let tip = tracked(&g, 'c', 3);
        let mut pending = PendingSet::new(vec![tracked(&g, 'b', 2)]);

        let next = util.first_fast_forward(&tip, &mut pending).unwrap();
        assert_eq!(next.id, id('c'));
        assert_eq!(pending.len(), 1);
    }

    #[tokio::test]
    async fn test_mark_clean_merges_returns_oldest_submitter() {
        let g = graph();
        let store = InMemoryReviewStore::new();
        store.add_approval(SubmitApproval {
            patch_set: PatchSetId::new(1, 1),
            account: crate::types::AccountId(7),
            granted: chrono::Utc::now(),
        });
        let util = MergeUtil::new(&g, &store);
        let batch: HashMap<_, _> = [tracked(&g, 'a', 1), tracked(&g, 'b', 2)]
            .into_iter()
            .map(|c| (c.id.clone(), c))
            .collect();
        let mut outcomes = OutcomeMap::new();

        let approval = util
            .mark_clean_merges(&id('b'), &[id('t')], &batch, &mut outcomes)
            .await
            .unwrap();

        assert_eq!(approval.map(|a| a.account.0), Some(7));
        assert_eq!(outcomes.get(&id('a')), Some(Outcome::CleanMerge));
        assert_eq!(outcomes.get(&id('b')), Some(Outcome::CleanMerge));
        assert!(!outcomes.is_final(&id('t')));
    }
}
