//! Run command - submit a batch onto its destination branch

use crate::cli::progress::CliProgress;
use crate::cli::style::{Stylize, check, cross};
use anstream::{eprintln, println};
use ff_submit::commit::{PendingSet, TrackedCommit};
use ff_submit::config::SubmitConfig;
use ff_submit::error::{Error, Result};
use ff_submit::graph::{CommitGraph, GitRepository, RefUpdater};
use ff_submit::store::Batch;
use ff_submit::strategy::{Policy, SubmitArgs, SubmitStrategy, integrate};
use std::path::Path;

/// Run the batch in `batch_path` against the repository at `repo_path`.
///
/// Returns whether every commit of the batch landed.
pub async fn run_batch(
    repo_path: &Path,
    batch_path: &Path,
    config_path: Option<&Path>,
    verbose: bool,
) -> Result<bool> {
    let config = SubmitConfig::load(config_path)?;
    let batch = Batch::load(batch_path)?;
    let repo = GitRepository::open(repo_path)?;
    let branch = batch.branch_ref();

    let tip_id = repo
        .read_ref(&branch.name)?
        .ok_or_else(|| Error::Git(format!("branch {} does not exist", branch.name)))?;
    let tip = repo.parse_commit(&tip_id)?;
    let merge_tip = TrackedCommit::untracked(tip.id, tip.parents, tip.message);

    let mut pending = PendingSet::new(batch.pending(&repo)?);
    let total = pending.len();
    let store = batch.to_store();
    let policy = Policy::from_config(&config, &branch.project)?;

    println!(
        "Submitting {} commit(s) to {} ({})",
        total.to_string().accent(),
        branch.name.accent(),
        policy.name().muted()
    );

    let progress = if verbose {
        CliProgress::verbose()
    } else {
        CliProgress::compact()
    };
    let strategy = SubmitStrategy::new(
        SubmitArgs::new(branch.clone(), &repo, &store).with_progress(&progress),
        policy,
    );

    let result = match integrate(&strategy, &repo, &merge_tip, &mut pending).await {
        Ok(result) => result,
        Err(e @ Error::LockFailure { .. }) => {
            eprintln!(
                "{} {} was updated by someone else; resubmit the batch",
                cross().for_stderr(),
                branch.name.warn()
            );
            return Err(e);
        }
        Err(e) => return Err(e),
    };

    let landed = result
        .outcomes
        .iter()
        .filter(|(_, outcome)| outcome.is_success())
        .count();

    println!();
    if result.new_tip.id == merge_tip.id {
        println!("{} unchanged at {}", branch.name.accent(), merge_tip.id.short());
    } else {
        println!(
            "{} {} {} -> {}",
            check(),
            branch.name.accent(),
            merge_tip.id.short().muted(),
            result.new_tip.id.short().emphasis()
        );
    }
    println!("{landed}/{total} commit(s) landed");

    Ok(landed == total)
}
