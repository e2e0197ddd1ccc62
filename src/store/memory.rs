//! In-memory review store

use super::ReviewStore;
use crate::error::{Error, Result};
use crate::types::{Account, AccountId, ChangeId, ChangeMessage, PatchSetId, SubmitApproval};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Review records held in memory
#[derive(Debug, Default)]
pub struct InMemoryReviewStore {
    approvals: Mutex<HashMap<PatchSetId, SubmitApproval>>,
    accounts: Mutex<HashMap<AccountId, Account>>,
    messages: Mutex<HashMap<ChangeId, Vec<ChangeMessage>>>,
}

impl InMemoryReviewStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a submit approval
    pub fn add_approval(&self, approval: SubmitApproval) {
        lock(&self.approvals).insert(approval.patch_set, approval);
    }

    /// Register an account
    pub fn add_account(&self, account: Account) {
        lock(&self.accounts).insert(account.id, account);
    }

    /// Seed a message without going through the engine
    pub fn add_message(&self, message: ChangeMessage) {
        let mut messages = lock(&self.messages);
        let trail = messages.entry(message.key.change).or_default();
        trail.push(message);
        trail.sort_by_key(|m| m.written_on);
    }

    /// Snapshot of a change's audit trail, oldest first
    pub fn messages(&self, change: ChangeId) -> Vec<ChangeMessage> {
        lock(&self.messages).get(&change).cloned().unwrap_or_default()
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

#[async_trait]
impl ReviewStore for InMemoryReviewStore {
    async fn submitter_of(&self, patch_set: PatchSetId) -> Result<Option<SubmitApproval>> {
        Ok(lock(&self.approvals).get(&patch_set).cloned())
    }

    async fn account(&self, id: AccountId) -> Result<Option<Account>> {
        Ok(lock(&self.accounts).get(&id).cloned())
    }

    async fn messages_by_change(&self, change: ChangeId) -> Result<Vec<ChangeMessage>> {
        Ok(self.messages(change))
    }

    async fn insert_message(&self, message: ChangeMessage) -> Result<()> {
        let mut messages = lock(&self.messages);
        let trail = messages.entry(message.key.change).or_default();
        if trail.iter().any(|m| m.key == message.key) {
            return Err(Error::Store(format!(
                "duplicate message key {}/{}",
                message.key.change, message.key.uuid
            )));
        }
        trail.push(message);
        Ok(())
    }
}
