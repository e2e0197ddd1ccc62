//! TOML file backed credential store

use super::{CredentialStore, ExternalCredentials};
use crate::error::{Error, Result};
use crate::types::AccountId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

#[derive(Debug, Default, Serialize, Deserialize)]
struct CredentialsFile {
    #[serde(default)]
    accounts: BTreeMap<String, CredentialsEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CredentialsEntry {
    external_user: String,
    private_key: String,
}

/// Credentials persisted in a TOML file keyed by account id
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<AccountId, ExternalCredentials>>,
}

impl FileCredentialStore {
    /// Load credentials from `path`. A missing file is an empty store.
    ///
    /// Entries with an invalid key are skipped with a warning so one bad
    /// account does not block every submitter.
    pub fn load(path: &Path) -> Result<Self> {
        let mut entries = BTreeMap::new();

        if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| {
                Error::Credentials(format!("failed to read {}: {e}", path.display()))
            })?;
            let file: CredentialsFile = toml::from_str(&content).map_err(|e| {
                Error::Credentials(format!("failed to parse {}: {e}", path.display()))
            })?;

            for (key, entry) in file.accounts {
                let account = key.parse::<u32>().map(AccountId).map_err(|_| {
                    Error::Credentials(format!("invalid account id {key:?} in {}", path.display()))
                })?;
                match ExternalCredentials::new(account, entry.external_user, entry.private_key) {
                    Ok(creds) => {
                        entries.insert(account, creds);
                    }
                    Err(e) => warn!(%account, error = %e, "ignoring stored credentials"),
                }
            }
        }

        debug!(path = %path.display(), accounts = entries.len(), "loaded credentials");
        Ok(Self {
            path: path.to_path_buf(),
            entries: Mutex::new(entries),
        })
    }

    /// Validate and store credentials for `account`, then save the file
    pub fn set(&self, account: AccountId, external_user: &str, private_key: &str) -> Result<()> {
        let creds = ExternalCredentials::new(account, external_user, private_key)?;
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        entries.insert(account, creds);
        self.save(&entries)
    }

    fn save(&self, entries: &BTreeMap<AccountId, ExternalCredentials>) -> Result<()> {
        let file = CredentialsFile {
            accounts: entries
                .values()
                .map(|c| {
                    (
                        c.account.to_string(),
                        CredentialsEntry {
                            external_user: c.external_user.clone(),
                            private_key: c.private_key.clone(),
                        },
                    )
                })
                .collect(),
        };

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| {
                Error::Credentials(format!("failed to create {}: {e}", dir.display()))
            })?;
        }

        let content = toml::to_string_pretty(&file)
            .map_err(|e| Error::Credentials(format!("failed to serialize credentials: {e}")))?;
        let content = format!("# ff-submit external credentials\n# Contains private keys - keep this file private\n\n{content}");

        fs::write(&self.path, content).map_err(|e| {
            Error::Credentials(format!("failed to write {}: {e}", self.path.display()))
        })
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn lookup(&self, account: AccountId) -> Result<Option<ExternalCredentials>> {
        Ok(self
            .entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(&account)
            .cloned())
    }
}
