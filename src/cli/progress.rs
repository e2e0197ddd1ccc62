//! CLI progress callback with styled output

use crate::cli::style::{Stylize, arrow, check, cross, outcome, outcome_marker};
use anstream::println;
use async_trait::async_trait;
use ff_submit::outcome::Outcome;
use ff_submit::strategy::{Phase, SubmitProgress};
use ff_submit::sync::HookResult;
use ff_submit::types::CommitId;

/// Prints phases, hook runs, audit messages and outcomes to stdout
pub struct CliProgress {
    /// Show phases and audit messages too
    pub verbose: bool,
}

impl CliProgress {
    /// Progress printing everything
    pub const fn verbose() -> Self {
        Self { verbose: true }
    }

    /// Progress printing outcomes and hook runs only
    pub const fn compact() -> Self {
        Self { verbose: false }
    }
}

#[async_trait]
impl SubmitProgress for CliProgress {
    async fn on_phase(&self, phase: Phase) {
        if self.verbose {
            println!("{}...", phase.to_string().emphasis());
        }
    }

    async fn on_outcome(&self, commit: &CommitId, result: Outcome) {
        println!(
            "  {} {} {}",
            outcome_marker(result),
            commit.short().accent(),
            outcome(result)
        );
    }

    async fn on_hook_started(&self, commit: &CommitId, ticket: &str) {
        println!(
            "  {} Syncing {} under ticket {}",
            arrow(),
            commit.short().accent(),
            ticket.accent()
        );
    }

    async fn on_hook_finished(&self, commit: &CommitId, result: Option<&HookResult>) {
        match result {
            Some(r) if r.is_success() => {
                println!("  {} Synced {}", check(), commit.short().emphasis());
            }
            Some(r) => {
                println!(
                    "  {} Sync of {} failed with exit code {}",
                    cross(),
                    commit.short().accent(),
                    r.exit_code.to_string().warn().for_stdout()
                );
            }
            None => {
                println!(
                    "  {} Sync hook for {} could not run",
                    cross(),
                    commit.short().accent()
                );
            }
        }
    }

    async fn on_message(&self, commit: &CommitId, message: &str) {
        if self.verbose {
            for line in message.lines() {
                println!("    {} {}", commit.short().muted(), line.muted());
            }
        }
    }
}
