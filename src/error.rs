//! Error types for ff-submit
//!
//! Only infrastructure faults are errors. Business results of a submission
//! (not fast-forward, missing ticket, failed external sync, ...) are
//! [`Outcome`](crate::outcome::Outcome)s recorded per commit.

use crate::types::CommitId;
use thiserror::Error;

/// Error message shown when a submitted key is not a private key.
pub const INVALID_PRIVATE_KEY_MESSAGE: &str =
    "Invalid SSH Private Key (note that it should be private not public key)";

/// Errors that can occur in ff-submit
#[derive(Error, Debug)]
pub enum Error {
    /// A commit could not be found in the object store
    #[error("missing commit object: {0}")]
    MissingObject(CommitId),

    /// Graph data could not be read or was malformed
    #[error("commit graph error: {0}")]
    Graph(String),

    /// A git command failed
    #[error("git command failed: {0}")]
    Git(String),

    /// Record store (changes, approvals, messages) failure
    #[error("review store error: {0}")]
    Store(String),

    /// Credential store failure
    #[error("credential store error: {0}")]
    Credentials(String),

    /// Supplied key is not a usable private key
    #[error("{INVALID_PRIVATE_KEY_MESSAGE}")]
    InvalidPrivateKey,

    /// Hook request failed validation at the hook boundary
    #[error("invalid hook request: {0}")]
    InvalidHookRequest(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Parse error (batch files, identifiers)
    #[error("parse error: {0}")]
    Parse(String),

    /// Destination ref moved underneath the submission
    #[error("lock failure updating {branch}: expected {expected}, found {actual}")]
    LockFailure {
        /// Destination ref name
        branch: String,
        /// Tip the submission was computed against
        expected: CommitId,
        /// Tip found at update time
        actual: String,
        /// Whether the caller may rerun the submission
        retryable: bool,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether rerunning the operation may succeed.
    ///
    /// Lock failures carry the strategy's own answer; everything else is
    /// either permanent or needs an operator.
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::LockFailure { retryable, .. } => *retryable,
            _ => false,
        }
    }
}

/// Result type alias for ff-submit operations
pub type Result<T> = std::result::Result<T, Error>;
