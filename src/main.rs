//! ff-submit - fast-forward submit
//!
//! CLI binary running submit strategies against a git repository.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod cli;

#[derive(Parser)]
#[command(name = "ff-submit")]
#[command(about = "Fast-forward submit with optional external mirror sync")]
#[command(version)]
struct Cli {
    /// Config file (defaults to <config dir>/ff-submit/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a batch file onto its destination branch
    Run {
        /// Path to the git repository
        #[arg(long, default_value = ".")]
        repo: PathBuf,

        /// Batch file (TOML)
        #[arg(long)]
        batch: PathBuf,
    },

    /// Check whether a commit would fast-forward a tip
    DryRun {
        /// Path to the git repository
        #[arg(long, default_value = ".")]
        repo: PathBuf,

        /// Destination branch
        #[arg(long, default_value = "main")]
        branch: String,

        /// Current tip (any revision git understands)
        #[arg(long)]
        tip: String,

        /// Candidate commit
        candidate: String,
    },

    /// Print the routing ticket found in a message
    Ticket {
        /// Message text
        text: String,
    },

    /// Validate a private key file
    CheckKey {
        /// Key file
        file: PathBuf,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("ff_submit=debug")
    } else {
        EnvFilter::try_from_env("FF_SUBMIT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

const fn exit_code(ok: bool) -> ExitCode {
    if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = cli.config.as_deref();

    let ok = match cli.command {
        Commands::Run { repo, batch } => {
            cli::run_batch(&repo, &batch, config, cli.verbose).await?
        }
        Commands::DryRun {
            repo,
            branch,
            tip,
            candidate,
        } => cli::run_dry_run(&repo, &branch, &tip, &candidate)?,
        Commands::Ticket { text } => cli::run_ticket(config, &text)?,
        Commands::CheckKey { file } => cli::run_check_key(&file)?,
    };

    Ok(exit_code(ok))
}
