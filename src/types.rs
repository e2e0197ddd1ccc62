//! Core types for ff-submit

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Standard namespace for branch refs
pub const R_HEADS: &str = "refs/heads/";

/// Content-addressed commit identity (lowercase hex)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommitId(String);

impl CommitId {
    /// Wrap a hex object name, normalizing to lowercase
    pub fn new(hex: impl Into<String>) -> Self {
        Self(hex.into().to_ascii_lowercase())
    }

    /// Parse and validate a hex object name
    pub fn parse(hex: &str) -> Result<Self> {
        let hex = hex.trim();
        if is_object_name(hex) {
            Ok(Self::new(hex))
        } else {
            Err(Error::Parse(format!("not a commit id: {hex:?}")))
        }
    }

    /// Full hex name
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated name for display
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(8)]
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether `s` looks like a full SHA-1 or SHA-256 object name
pub fn is_object_name(s: &str) -> bool {
    (s.len() == 40 || s.len() == 64) && s.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Numeric change identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeId(pub u32);

impl fmt::Display for ChangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One reviewed revision of a change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PatchSetId {
    /// Owning change
    pub change: ChangeId,
    /// Patch set number within the change (1-based)
    pub number: u32,
}

impl PatchSetId {
    /// Create a patch set id
    pub const fn new(change: u32, number: u32) -> Self {
        Self {
            change: ChangeId(change),
            number,
        }
    }

    /// Ref under which this patch set is stored, e.g. `refs/changes/45/12345/2`
    pub fn to_ref_name(&self) -> String {
        let change = self.change.0;
        format!("refs/changes/{:02}/{change}/{}", change % 100, self.number)
    }
}

impl fmt::Display for PatchSetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.change, self.number)
    }
}

/// Numeric account identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub u32);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A user account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account id
    pub id: AccountId,
    /// Display name
    #[serde(default)]
    pub full_name: Option<String>,
    /// Preferred email address
    #[serde(default)]
    pub preferred_email: Option<String>,
}

/// Destination branch of a submission
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BranchRef {
    /// Project (repository) name
    pub project: String,
    /// Full ref name, e.g. `refs/heads/main`
    pub name: String,
}

impl BranchRef {
    /// Create a branch ref, qualifying short names under `refs/heads/`
    pub fn new(project: impl Into<String>, name: impl Into<String>) -> Self {
        let name = name.into();
        let name = if name.starts_with("refs/") {
            name
        } else {
            format!("{R_HEADS}{name}")
        };
        Self {
            project: project.into(),
            name,
        }
    }

    /// Branch name without the `refs/heads/` namespace, if it lives there
    pub fn short_name(&self) -> Option<&str> {
        self.name.strip_prefix(R_HEADS)
    }
}

impl fmt::Display for BranchRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.project, self.name)
    }
}

/// Primary key of a change message
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageKey {
    /// Change the message belongs to
    pub change: ChangeId,
    /// Unique message id
    pub uuid: String,
}

/// Audit-trail record attached to a change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeMessage {
    /// Message key
    pub key: MessageKey,
    /// Author, `None` for messages written by the server
    #[serde(default)]
    pub author: Option<AccountId>,
    /// Patch set the message refers to
    #[serde(default)]
    pub patch_set: Option<PatchSetId>,
    /// When the message was written
    pub written_on: DateTime<Utc>,
    /// Message body
    pub message: String,
}

/// The submit approval recorded on a patch set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitApproval {
    /// Approved patch set
    pub patch_set: PatchSetId,
    /// Account that pressed submit
    pub account: AccountId,
    /// When the approval was granted
    pub granted: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_set_ref_name() {
        assert_eq!(
            PatchSetId::new(12345, 2).to_ref_name(),
            "refs/changes/45/12345/2"
        );
        assert_eq!(PatchSetId::new(7, 1).to_ref_name(), "refs/changes/07/7/1");
    }

    #[test]
    fn test_branch_ref_qualifies_short_names() {
        let branch = BranchRef::new("proj", "main");
        assert_eq!(branch.name, "refs/heads/main");
        assert_eq!(branch.short_name(), Some("main"));

        let tag = BranchRef::new("proj", "refs/meta/config");
        assert_eq!(tag.short_name(), None);
    }

    #[test]
    fn test_commit_id_parse() {
        let id = CommitId::parse(&"AB".repeat(20)).unwrap();
        assert_eq!(id.as_str(), "ab".repeat(20));
        assert_eq!(id.short(), "abababab");
        assert!(CommitId::parse("deadbeef").is_err());
        assert!(CommitId::parse(&"zz".repeat(20)).is_err());
    }
}
