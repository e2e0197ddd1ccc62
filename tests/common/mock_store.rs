//! Review store wrapper with injectable approval lookup failures
//!
//! These are test utilities - not all may be used in current tests but are
//! available for future test development.

#![allow(dead_code)]

use async_trait::async_trait;
use ff_submit::error::{Error, Result};
use ff_submit::store::{InMemoryReviewStore, ReviewStore};
use ff_submit::types::{Account, AccountId, ChangeId, ChangeMessage, PatchSetId, SubmitApproval};
use std::sync::Mutex;

/// Delegates to an [`InMemoryReviewStore`], failing `submitter_of` once a
/// number of lookups have succeeded
pub struct FlakyStore<'a> {
    inner: &'a InMemoryReviewStore,
    healthy_lookups: usize,
    lookups: Mutex<usize>,
}

impl<'a> FlakyStore<'a> {
    /// Fail every approval lookup after the first `healthy_lookups`
    pub fn failing_after(inner: &'a InMemoryReviewStore, healthy_lookups: usize) -> Self {
        Self {
            inner,
            healthy_lookups,
            lookups: Mutex::new(0),
        }
    }

    pub fn lookups(&self) -> usize {
        *self.lookups.lock().unwrap()
    }
}

#[async_trait]
impl ReviewStore for FlakyStore<'_> {
    async fn submitter_of(&self, patch_set: PatchSetId) -> Result<Option<SubmitApproval>> {
        let seen = {
            let mut lookups = self.lookups.lock().unwrap();
            *lookups += 1;
            *lookups
        };
        if seen > self.healthy_lookups {
            return Err(Error::Store("approval table unavailable".to_string()));
        }
        self.inner.submitter_of(patch_set).await
    }

    async fn account(&self, id: AccountId) -> Result<Option<Account>> {
        self.inner.account(id).await
    }

    async fn messages_by_change(&self, change: ChangeId) -> Result<Vec<ChangeMessage>> {
        self.inner.messages_by_change(change).await
    }

    async fn insert_message(&self, message: ChangeMessage) -> Result<()> {
        self.inner.insert_message(message).await
    }
}
