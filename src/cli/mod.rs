//! CLI commands
//!
//! Command implementations for the `ff-submit` binary.

mod check_key;
mod dry_run;
mod progress;
mod run;
mod style;
mod ticket;

pub use check_key::run_check_key;
pub use dry_run::run_dry_run;
pub use run::run_batch;
pub use ticket::run_ticket;
