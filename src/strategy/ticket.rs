//! Routing ticket extraction

use crate::error::{Error, Result};
use crate::types::ChangeMessage;
use regex::Regex;
use tracing::debug;

/// Pattern used when none is configured
pub const DEFAULT_TICKET_PATTERN: &str = r"TICKET:\s?([0-9]+)";

/// Finds routing tickets in commit and change messages.
///
/// The first capture group of the pattern is the ticket.
#[derive(Debug, Clone)]
pub struct TicketMatcher {
    pattern: Regex,
}

impl TicketMatcher {
    /// Compile `pattern`, which must have at least one capture group
    pub fn new(pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern)
            .map_err(|e| Error::Config(format!("invalid ticket pattern {pattern:?}: {e}")))?;
        if regex.captures_len() < 2 {
            return Err(Error::Config(format!(
                "ticket pattern {pattern:?} has no capture group"
            )));
        }
        Ok(Self { pattern: regex })
    }

    /// Source of the compiled pattern
    pub fn as_str(&self) -> &str {
        self.pattern.as_str()
    }

    /// First ticket mentioned in `text`
    pub fn find(&self, text: &str) -> Option<String> {
        let ticket = self
            .pattern
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())?;
        debug!(%ticket, "ticket matched");
        Some(ticket)
    }

    /// Ticket for a commit: its own message first, then every change
    /// message in chronological order. A later match replaces an earlier one.
    ///
    /// Messages without an author were written by the server (submission
    /// notes, hook output) and are not searched.
    pub fn extract(&self, commit_message: &str, change_messages: &[ChangeMessage]) -> Option<String> {
        let mut ordered: Vec<&ChangeMessage> = change_messages
            .iter()
            .filter(|m| m.author.is_some())
            .collect();
        ordered.sort_by_key(|m| m.written_on);

        std::iter::once(commit_message)
            .chain(ordered.iter().map(|m| m.message.as_str()))
            .filter_map(|text| self.find(text))
            .last()
    }
}

impl Default for TicketMatcher {
    fn default() -> Self {
        Self {
            pattern: Regex::new(DEFAULT_TICKET_PATTERN).expect("default ticket pattern is valid"),
        }
    }
}
