//! External-system credentials per account
//!
//! A submitter needs a username and private key for the external mirror
//! before their changes may be synced to it.

mod file;

pub use file::FileCredentialStore;

use crate::error::{Error, Result};
use crate::types::AccountId;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

/// Username and private key for the external mirror
#[derive(Clone, PartialEq, Eq)]
pub struct ExternalCredentials {
    /// Owning account
    pub account: AccountId,
    /// Username on the external system
    pub external_user: String,
    /// Private key (PEM/OpenSSH armor)
    pub private_key: String,
}

impl ExternalCredentials {
    /// Build credentials, validating the key
    pub fn new(
        account: AccountId,
        external_user: impl Into<String>,
        private_key: impl Into<String>,
    ) -> Result<Self> {
        let external_user = external_user.into().trim().to_string();
        if external_user.is_empty() {
            return Err(Error::Credentials(format!(
                "account {account}: external username is empty"
            )));
        }
        let private_key = private_key.into();
        validate_private_key(&private_key)?;
        Ok(Self {
            account,
            external_user,
            private_key,
        })
    }
}

impl fmt::Debug for ExternalCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExternalCredentials")
            .field("account", &self.account)
            .field("external_user", &self.external_user)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// Check that `key` is an armored private key (not a public key)
pub fn validate_private_key(key: &str) -> Result<()> {
    let key = key.trim();
    let Some(first) = key.lines().next() else {
        return Err(Error::InvalidPrivateKey);
    };
    let Some(last) = key.lines().last() else {
        return Err(Error::InvalidPrivateKey);
    };

    let is_begin = first.starts_with("-----BEGIN ") && first.ends_with("PRIVATE KEY-----");
    let is_end = last.starts_with("-----END ") && last.ends_with("PRIVATE KEY-----");
    let has_body = key.lines().count() > 2;

    if is_begin && is_end && has_body {
        Ok(())
    } else {
        Err(Error::InvalidPrivateKey)
    }
}

/// Lookup of external credentials by account
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Credentials of `account`, `None` if never configured
    async fn lookup(&self, account: AccountId) -> Result<Option<ExternalCredentials>>;
}

/// Credentials held in memory
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    entries: Mutex<HashMap<AccountId, ExternalCredentials>>,
}

impl InMemoryCredentialStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Store credentials, replacing any previous entry
    pub fn insert(&self, credentials: ExternalCredentials) {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(credentials.account, credentials);
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn lookup(&self, account: AccountId) -> Result<Option<ExternalCredentials>> {
        Ok(self
            .entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(&account)
            .cloned())
    }
}
