//! Ticket command - show the routing ticket found in a message

use crate::cli::style::Stylize;
use anstream::{eprintln, println};
use ff_submit::config::SubmitConfig;
use ff_submit::error::Result;
use std::path::Path;

/// Print the ticket in `text`. Returns whether one was found.
pub fn run_ticket(config_path: Option<&Path>, text: &str) -> Result<bool> {
    let tickets = SubmitConfig::load(config_path)?.tickets()?;
    match tickets.extract(text, &[]) {
        Some(ticket) => {
            println!("{ticket}");
            Ok(true)
        }
        None => {
            eprintln!("{}", format!("no ticket matching {}", tickets.as_str()).warn());
            Ok(false)
        }
    }
}
