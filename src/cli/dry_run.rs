//! Dry-run command - check whether a commit fast-forwards a tip

use crate::cli::style::{Stylize, check, cross};
use anstream::println;
use ff_submit::commit::TrackedCommit;
use ff_submit::error::Result;
use ff_submit::graph::{CommitGraph, GitRepository};
use ff_submit::store::InMemoryReviewStore;
use ff_submit::strategy::{Policy, SubmitArgs, SubmitStrategy};
use ff_submit::types::BranchRef;
use std::path::Path;

/// Report whether `candidate` would fast-forward `tip`
pub fn run_dry_run(repo_path: &Path, branch: &str, tip: &str, candidate: &str) -> Result<bool> {
    let repo = GitRepository::open(repo_path)?;
    let store = InMemoryReviewStore::new();

    let load = |rev: &str| -> Result<TrackedCommit> {
        let commit = repo.parse_commit(&repo.resolve(rev)?)?;
        Ok(TrackedCommit::untracked(commit.id, commit.parents, commit.message))
    };
    let tip = load(tip)?;
    let candidate = load(candidate)?;

    let project = repo_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let strategy = SubmitStrategy::new(
        SubmitArgs::new(BranchRef::new(project, branch), &repo, &store),
        Policy::LocalOnly,
    );

    let fast_forward = strategy.dry_run(&tip, &candidate)?;
    if fast_forward {
        println!(
            "{} {} fast-forwards {}",
            check(),
            candidate.id.short().accent(),
            tip.id.short().accent()
        );
    } else {
        println!(
            "{} {} does not fast-forward {}",
            cross(),
            candidate.id.short().accent(),
            tip.id.short().accent()
        );
    }
    Ok(fast_forward)
}
