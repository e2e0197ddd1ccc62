//! Review record store
//!
//! Changes, approvals, accounts and change messages live in an external
//! transactional store. The engine only needs the handful of reads and the
//! single append defined by [`ReviewStore`].

mod batch;
mod memory;

pub use batch::{Batch, BatchAccount, BatchChange, BatchMessage};
pub use memory::InMemoryReviewStore;

use crate::error::Result;
use crate::types::{Account, AccountId, ChangeId, ChangeMessage, PatchSetId, SubmitApproval};
use async_trait::async_trait;

/// Record store operations used during submission
#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Submit approval recorded on `patch_set`
    async fn submitter_of(&self, patch_set: PatchSetId) -> Result<Option<SubmitApproval>>;

    /// Look up an account
    async fn account(&self, id: AccountId) -> Result<Option<Account>>;

    /// Every message recorded on `change`, oldest first
    async fn messages_by_change(&self, change: ChangeId) -> Result<Vec<ChangeMessage>>;

    /// Append a message to a change's audit trail and commit it
    async fn insert_message(&self, message: ChangeMessage) -> Result<()>;
}
