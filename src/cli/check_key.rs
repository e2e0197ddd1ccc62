//! Check-key command - validate a private key file before storing it

use crate::cli::style::{Stylize, check, cross};
use anstream::{eprintln, println};
use ff_submit::credentials::validate_private_key;
use ff_submit::error::Result;
use std::fs;
use std::path::Path;

/// Validate the key in `path`. Returns whether it is a usable private key.
pub fn run_check_key(path: &Path) -> Result<bool> {
    let key = fs::read_to_string(path)?;
    match validate_private_key(&key) {
        Ok(()) => {
            println!("{} {} is a private key", check(), path.display().accent());
            Ok(true)
        }
        Err(e) => {
            eprintln!("{} {}", cross().for_stderr(), e.to_string().error());
            Ok(false)
        }
    }
}
