//! Hosting platform port
//!
//! The request/response contract consumed from the source-control host:
//! list repositories, read a file, read branch heads, create a branch,
//! update a file, open a pull request.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::models::{BranchRef, Repository};

/// Failure of a single hosting API call
#[derive(Debug, Error)]
pub enum HostingError {
    /// The remote answered with a non-success status
    #[error("{endpoint} returned HTTP {status}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Endpoint path that was called
        endpoint: String,
    },

    /// The request never produced a response
    #[error("request failed: {0}")]
    Transport(String),

    /// The response body did not have the expected shape
    #[error("unexpected response from {endpoint}: {message}")]
    Decode {
        /// Endpoint path that was called
        endpoint: String,
        /// What was wrong with the body
        message: String,
    },
}

impl HostingError {
    /// HTTP status observed, if the remote answered at all
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(_) | Self::Decode { .. } => None,
        }
    }

    /// Whether the remote reported a stale content hash on write
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self.status(), Some(409))
    }
}

/// A file read from a repository branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    /// Decoded file content
    pub content: String,

    /// Content hash of this revision, required for the later write
    pub sha: String,
}

/// Content update committed onto a branch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileUpdate {
    /// Path of the file inside the repository
    pub path: String,

    /// Branch receiving the commit
    pub branch: String,

    /// Commit message
    pub message: String,

    /// New file content (plain text; the adapter encodes it)
    pub content: String,

    /// Content hash of the revision the edit was based on
    pub base_sha: String,
}

/// Pull request to open
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestDraft {
    /// Title
    pub title: String,

    /// Description
    pub body: String,

    /// Branch carrying the change
    pub head: String,

    /// Branch to merge into
    pub base: String,
}

/// Remote hosting API
///
/// Implementations perform blocking calls. Any non-success response is an
/// error; `get_file` maps "not found" to `Ok(None)`.
#[cfg_attr(test, mockall::automock)]
pub trait HostingApi: Send + Sync {
    /// All repositories of `organization` visible to the credentials, in listing order
    fn list_repositories(&self, organization: &str) -> Result<Vec<Repository>, HostingError>;

    /// Read `path` from the repository's default branch
    fn get_file(&self, repo: &Repository, path: &str) -> Result<Option<RemoteFile>, HostingError>;

    /// List the branch head refs of a repository
    fn list_branch_refs(&self, repo: &Repository) -> Result<Vec<BranchRef>, HostingError>;

    /// Create `refs/heads/<branch>` pointing at `sha`
    fn create_branch(&self, repo: &Repository, branch: &str, sha: &str)
    -> Result<(), HostingError>;

    /// Commit a content update; returns the new commit hash
    fn update_file(&self, repo: &Repository, update: &FileUpdate) -> Result<String, HostingError>;

    /// Open a pull request; returns its web URL
    fn create_pull_request(
        &self,
        repo: &Repository,
        draft: &PullRequestDraft,
    ) -> Result<String, HostingError>;
}
