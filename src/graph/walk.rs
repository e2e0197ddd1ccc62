//! Revision walk over a [`CommitGraph`]
//!
//! A walk enumerates the commits reachable from its start points but not
//! from its uninteresting points. Commits are ordered topologically; the
//! reverse order yields parents before children, which is the order a
//! sequence of fast-forwards lands in.
//!
//! The walk borrows the graph for its whole lifetime and is released when
//! dropped, on every exit path.

use super::{CommitGraph, GraphCommit};
use crate::error::Result;
use crate::types::CommitId;
use std::collections::{HashSet, VecDeque};
use tracing::trace;

/// Output order of a walk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RevSort {
    /// Children before parents
    #[default]
    Topo,
    /// Parents before children (oldest first)
    TopoReverse,
}

/// A single-use revision walk
pub struct RevWalk<'g> {
    graph: &'g dyn CommitGraph,
    starts: Vec<CommitId>,
    uninteresting: Vec<CommitId>,
    sort: RevSort,
    /// Ordered ids, computed on the first call to `next`
    queue: Option<VecDeque<CommitId>>,
}

impl<'g> RevWalk<'g> {
    /// Create an empty walk over `graph`
    pub fn new(graph: &'g dyn CommitGraph) -> Self {
        Self {
            graph,
            starts: Vec::new(),
            uninteresting: Vec::new(),
            sort: RevSort::default(),
            queue: None,
        }
    }

    /// Walk from `id`
    pub fn mark_start(&mut self, id: &CommitId) -> &mut Self {
        self.starts.push(id.clone());
        self
    }

    /// Stop at `id` and everything reachable from it
    pub fn mark_uninteresting(&mut self, id: &CommitId) -> &mut Self {
        self.uninteresting.push(id.clone());
        self
    }

    /// Set the output order
    pub fn sort(&mut self, sort: RevSort) -> &mut Self {
        self.sort = sort;
        self
    }

    /// Next commit of the walk, parsed from the object store
    pub fn next(&mut self) -> Result<Option<GraphCommit>> {
        if self.queue.is_none() {
            self.queue = Some(self.order()?);
        }
        let Some(id) = self.queue.as_mut().and_then(VecDeque::pop_front) else {
            return Ok(None);
        };
        self.graph.parse_commit(&id).map(Some)
    }

    /// Ids the walk has not returned yet (empty before the first `next`)
    pub fn remaining(&self) -> Vec<CommitId> {
        self.queue
            .as_ref()
            .map(|q| q.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Drain the walk into a vector
    pub fn collect_all(&mut self) -> Result<Vec<GraphCommit>> {
        let mut out = Vec::new();
        while let Some(commit) = self.next()? {
            out.push(commit);
        }
        Ok(out)
    }

    fn order(&self) -> Result<VecDeque<CommitId>> {
        let hidden = self.reachable(&self.uninteresting)?;

        // Depth-first post-order over parents: every parent is emitted before
        // its children, first parents before later ones.
        let mut emitted: HashSet<CommitId> = HashSet::new();
        let mut oldest_first: Vec<CommitId> = Vec::new();
        for start in &self.starts {
            let mut stack: Vec<(CommitId, bool)> = vec![(start.clone(), false)];
            while let Some((id, expanded)) = stack.pop() {
                if hidden.contains(&id) || emitted.contains(&id) {
                    continue;
                }
                if expanded {
                    emitted.insert(id.clone());
                    oldest_first.push(id);
                    continue;
                }
                let commit = self.graph.parse_commit(&id)?;
                stack.push((id, true));
                for parent in commit.parents.into_iter().rev() {
                    if !hidden.contains(&parent) && !emitted.contains(&parent) {
                        stack.push((parent, false));
                    }
                }
            }
        }

        trace!(
            commits = oldest_first.len(),
            hidden = hidden.len(),
            "revision walk ordered"
        );

        Ok(match self.sort {
            RevSort::TopoReverse => oldest_first.into(),
            RevSort::Topo => oldest_first.into_iter().rev().collect(),
        })
    }

    fn reachable(&self, from: &[CommitId]) -> Result<HashSet<CommitId>> {
        let mut seen = HashSet::new();
        let mut queue: VecDeque<CommitId> = from.iter().cloned().collect();
        while let Some(id) = queue.pop_front() {
            if !seen.insert(id.clone()) {
                continue;
            }
            queue.extend(self.graph.parse_commit(&id)?.parents);
        }
        Ok(seen)
    }
}

impl Drop for RevWalk<'_> {
    fn drop(&mut self) {
        trace!(
            unvisited = self.queue.as_ref().map_or(0, VecDeque::len),
            "revision walk released"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::InMemoryGraph;

    fn id(c: char) -> CommitId {
        CommitId::new(c.to_string().repeat(40))
    }

    /// a <- b <- c <- e
    ///       \-- d --/
    fn diamond() -> InMemoryGraph {
        let graph = InMemoryGraph::new("/tmp/repo");
        graph.add_commit(id('a'), &[], "root");
        graph.add_commit(id('b'), &[id('a')], "b");
        graph.add_commit(id('c'), &[id('b')], "c");
        graph.add_commit(id('d'), &[id('b')], "d");
        graph.add_commit(id('e'), &[id('c'), id('d')], "merge");
        graph
    }

    fn ids(commits: &[GraphCommit]) -> Vec<CommitId> {
        commits.iter().map(|c| c.id.clone()).collect()
    }

    #[test]
    fn test_reverse_walk_is_oldest_first() {
        let graph = diamond();
        let mut walk = RevWalk::new(&graph);
        walk.mark_start(&id('e'))
            .mark_uninteresting(&id('a'))
            .sort(RevSort::TopoReverse);

        let commits = walk.collect_all().unwrap();
        assert_eq!(ids(&commits), vec![id('b'), id('c'), id('d'), id('e')]);
    }

    #[test]
    fn test_topo_walk_is_newest_first() {
        let graph = diamond();
        let mut walk = RevWalk::new(&graph);
        walk.mark_start(&id('c')).mark_uninteresting(&id('a'));

        let commits = walk.collect_all().unwrap();
        assert_eq!(ids(&commits), vec![id('c'), id('b')]);
    }

    #[test]
    fn test_uninteresting_hides_shared_history() {
        let graph = diamond();
        let mut walk = RevWalk::new(&graph);
        walk.mark_start(&id('e')).mark_uninteresting(&id('c'));

        let commits = walk.collect_all().unwrap();
        assert_eq!(ids(&commits), vec![id('e'), id('d')]);
    }

    #[test]
    fn test_same_start_and_stop_is_empty() {
        let graph = diamond();
        let mut walk = RevWalk::new(&graph);
        walk.mark_start(&id('c')).mark_uninteresting(&id('c'));
        assert!(walk.next().unwrap().is_none());
    }

    #[test]
    fn test_missing_object_is_an_error() {
        let graph = diamond();
        let mut walk = RevWalk::new(&graph);
        walk.mark_start(&id('f'));
        assert!(walk.next().is_err());
    }
}
