//! Change message side channel

use super::progress::SubmitProgress;
use crate::commit::TrackedCommit;
use crate::store::ReviewStore;
use crate::types::{ChangeMessage, MessageKey};
use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Writes server messages to the audit trail of the change a commit belongs to
pub(crate) struct AuditTrail<'a> {
    store: &'a dyn ReviewStore,
    progress: &'a dyn SubmitProgress,
}

impl<'a> AuditTrail<'a> {
    pub(crate) fn new(store: &'a dyn ReviewStore, progress: &'a dyn SubmitProgress) -> Self {
        Self { store, progress }
    }

    /// Append `body` under a fresh key. A failed write is logged, not raised.
    pub(crate) async fn append(&self, commit: &TrackedCommit, body: &str) {
        let Some(patch_set) = commit.patch_set else {
            debug!(commit = %commit.id, "no change to record message on");
            return;
        };

        let message = ChangeMessage {
            key: MessageKey {
                change: patch_set.change,
                uuid: Uuid::new_v4().to_string(),
            },
            author: None,
            patch_set: Some(patch_set),
            written_on: Utc::now(),
            message: body.to_string(),
        };

        if let Err(e) = self.store.insert_message(message).await {
            warn!(
                commit = %commit.id,
                change = %patch_set.change,
                error = %e,
                "cannot record change message"
            );
            return;
        }
        self.progress.on_message(&commit.id, body).await;
    }
}
