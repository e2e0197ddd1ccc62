//! External sync hook boundary
//!
//! Commits on some branches must also land in a legacy mirror before the
//! branch may move. The mirror is only reachable through a hook: the engine
//! builds a [`HookRequest`], hands it to a [`SyncHook`] and interprets the
//! returned [`HookResult`].

mod command;

pub use command::CommandHook;

use crate::error::{Error, Result};
use crate::types::{Account, CommitId, is_object_name};
use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;

/// Everything the hook needs to push one commit to the mirror
#[derive(Clone, PartialEq, Eq)]
pub struct HookRequest {
    /// Project name
    pub project: String,
    /// Repository location on disk
    pub repo_path: PathBuf,
    /// Ref of the patch set being pushed
    pub change_ref: String,
    /// Destination branch ref
    pub branch: String,
    /// Routing ticket
    pub ticket: String,
    /// Submitter account
    pub account: Account,
    /// Submitter's username on the mirror
    pub external_user: String,
    /// Submitter's private key for the mirror
    pub external_secret: String,
    /// Branch tip before this commit
    pub old_rev: CommitId,
    /// Commit being pushed
    pub new_rev: CommitId,
}

impl HookRequest {
    /// Reject requests the hook could not act on
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("project", self.project.as_str()),
            ("branch", self.branch.as_str()),
            ("change ref", self.change_ref.as_str()),
            ("ticket", self.ticket.as_str()),
            ("external user", self.external_user.as_str()),
            ("external secret", self.external_secret.as_str()),
        ];
        if let Some((field, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(Error::InvalidHookRequest(format!("{field} is empty")));
        }
        for (field, rev) in [("old rev", &self.old_rev), ("new rev", &self.new_rev)] {
            if !is_object_name(rev.as_str()) {
                return Err(Error::InvalidHookRequest(format!(
                    "{field} is not a commit id: {rev}"
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Debug for HookRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookRequest")
            .field("project", &self.project)
            .field("repo_path", &self.repo_path)
            .field("change_ref", &self.change_ref)
            .field("branch", &self.branch)
            .field("ticket", &self.ticket)
            .field("account", &self.account.id)
            .field("external_user", &self.external_user)
            .field("external_secret", &"<redacted>")
            .field("old_rev", &self.old_rev)
            .field("new_rev", &self.new_rev)
            .finish()
    }
}

/// What the hook reported
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookResult {
    /// Process exit code, 0 on success
    pub exit_code: i32,
    /// Combined stdout and stderr
    pub output: String,
}

impl HookResult {
    /// Whether the push went through
    pub const fn is_success(&self) -> bool {
        self.exit_code == 0
    }
}

/// A way of pushing one commit to the external mirror
///
/// Returns `None` when the hook could not be run at all.
#[async_trait]
pub trait SyncHook: Send + Sync {
    /// Push `request.new_rev` to the mirror
    async fn invoke(&self, request: &HookRequest) -> Option<HookResult>;
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::types::AccountId;

    pub(crate) fn request() -> HookRequest {
        HookRequest {
            project: "platform/core".to_string(),
            repo_path: PathBuf::from("/srv/git/platform/core.git"),
            change_ref: "refs/changes/21/4521/2".to_string(),
            branch: "refs/heads/main".to_string(),
            ticket: "4521".to_string(),
            account: Account {
                id: AccountId(1000),
                full_name: Some("Jo Dev".to_string()),
                preferred_email: None,
            },
            external_user: "jdev".to_string(),
            external_secret: "secret".to_string(),
            old_rev: CommitId::new("a".repeat(40)),
            new_rev: CommitId::new("b".repeat(40)),
        }
    }

    #[test]
    fn test_valid_request() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn test_empty_ticket_rejected() {
        let mut req = request();
        req.ticket = " ".to_string();
        let err = req.validate().unwrap_err();
        assert!(err.to_string().contains("ticket"));
    }

    #[test]
    fn test_bad_rev_rejected() {
        let mut req = request();
        req.new_rev = CommitId::new("HEAD");
        assert!(matches!(
            req.validate(),
            Err(Error::InvalidHookRequest(_))
        ));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let shown = format!("{:?}", request());
        assert!(!shown.contains("\"secret\""));
        assert!(shown.contains("<redacted>"));
    }
}
