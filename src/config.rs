//! Configuration
//!
//! Read from `<config dir>/ff-submit/config.toml` unless a path is given.
//! A missing file means defaults: local-only fast-forward everywhere.

use crate::error::{Error, Result};
use crate::strategy::{DEFAULT_TICKET_PATTERN, TicketMatcher};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Which fast-forward strategy a project submits with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitType {
    /// Fast-forward only, no external mirror
    #[default]
    FastForwardOnly,
    /// Fast-forward, pushing each commit to the external mirror first
    FastForwardWithExternalSync,
}

/// `[hook]` table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookConfig {
    /// Executable that pushes one commit to the external mirror
    #[serde(default)]
    pub external_sync: Option<PathBuf>,
}

/// `[credentials]` table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialsConfig {
    /// Credentials file (defaults next to the config file)
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Per-project settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Overrides `default_submit_type`
    #[serde(default)]
    pub submit_type: Option<SubmitType>,
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitConfig {
    /// Regex locating routing tickets; first capture group is the ticket
    #[serde(default = "default_ticket_pattern")]
    pub ticket_pattern: String,
    /// Submit type of projects without their own entry
    #[serde(default)]
    pub default_submit_type: SubmitType,
    /// Hook settings
    #[serde(default)]
    pub hook: HookConfig,
    /// Credential store settings
    #[serde(default)]
    pub credentials: CredentialsConfig,
    /// Project overrides keyed by project name
    #[serde(default)]
    pub projects: BTreeMap<String, ProjectConfig>,
}

fn default_ticket_pattern() -> String {
    DEFAULT_TICKET_PATTERN.to_string()
}

impl Default for SubmitConfig {
    fn default() -> Self {
        Self {
            ticket_pattern: default_ticket_pattern(),
            default_submit_type: SubmitType::default(),
            hook: HookConfig::default(),
            credentials: CredentialsConfig::default(),
            projects: BTreeMap::new(),
        }
    }
}

/// Directory holding ff-submit's config and credentials
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("ff-submit"))
}

/// Default config file location
pub fn default_config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

impl SubmitConfig {
    /// Load from `path`, or from the default location when `None`
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match default_config_path() {
                Some(path) => path,
                None => return Ok(Self::default()),
            },
        };

        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse {}: {e}", path.display())))?;
        config.tickets()?;
        Ok(config)
    }

    /// Parse and validate TOML text
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| Error::Config(format!("invalid TOML: {e}")))?;
        config.tickets()?;
        Ok(config)
    }

    /// Compiled ticket pattern
    pub fn tickets(&self) -> Result<TicketMatcher> {
        TicketMatcher::new(&self.ticket_pattern)
    }

    /// Submit type configured for `project`
    pub fn submit_type(&self, project: &str) -> SubmitType {
        self.projects
            .get(project)
            .and_then(|p| p.submit_type)
            .unwrap_or(self.default_submit_type)
    }

    /// Credentials file location
    pub fn credentials_path(&self) -> Option<PathBuf> {
        self.credentials
            .path
            .clone()
            .or_else(|| config_dir().map(|dir| dir.join("credentials.toml")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = SubmitConfig::parse("").unwrap();
        assert_eq!(config, SubmitConfig::default());
        assert_eq!(config.submit_type("any"), SubmitType::FastForwardOnly);
        assert_eq!(config.ticket_pattern, DEFAULT_TICKET_PATTERN);
    }

    #[test]
    fn test_project_override() {
        let config = SubmitConfig::parse(
            r#"
default_submit_type = "fast_forward_only"

[hook]
external_sync = "/usr/local/bin/external-sync-hook"

[projects."platform/core"]
submit_type = "fast_forward_with_external_sync"
"#,
        )
        .unwrap();

        assert_eq!(
            config.submit_type("platform/core"),
            SubmitType::FastForwardWithExternalSync
        );
        assert_eq!(config.submit_type("platform/web"), SubmitType::FastForwardOnly);
        assert_eq!(
            config.hook.external_sync.as_deref(),
            Some(Path::new("/usr/local/bin/external-sync-hook"))
        );
    }

    #[test]
    fn test_invalid_ticket_pattern() {
        let err = SubmitConfig::parse("ticket_pattern = \"TICKET: [0-9]+\"").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_unknown_submit_type() {
        assert!(SubmitConfig::parse("default_submit_type = \"cherry_pick\"").is_err());
    }

    #[test]
    fn test_missing_file_is_default() {
        let temp = TempDir::new().unwrap();
        let config = SubmitConfig::load(Some(&temp.path().join("config.toml"))).unwrap();
        assert_eq!(config, SubmitConfig::default());
    }

    #[test]
    fn test_load_reports_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "ticket_pattern = [").unwrap();
        let err = SubmitConfig::load(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("config.toml"));
    }
}
