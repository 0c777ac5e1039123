//! Publication pipeline - branch, commit, pull request
//!
//! One run of the pipeline per modified repository:
//!
//! ```text
//! BranchPending -> BranchCreated -> CommitPending -> CommitCreated -> PrPending -> Published
//!        \________________\________________\________________\____________\______> Aborted
//! ```
//!
//! Each step only runs after the previous one succeeded. A failure aborts
//! this repository's publication and leaves whatever the remote already
//! accepted in place.

use log::{debug, info};
use serde::Serialize;
use thiserror::Error;

use crate::core::models::Repository;
use crate::core::ports::{FileUpdate, HostingApi, HostingError, PullRequestDraft};

/// States of one publication
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PublicationState {
    /// Branch not yet requested
    BranchPending,
    /// Branch exists on the remote
    BranchCreated,
    /// Content update not yet accepted
    CommitPending,
    /// Commit exists on the branch
    CommitCreated,
    /// Pull request not yet opened
    PrPending,
    /// Pull request opened
    Published,
    /// A step failed
    Aborted,
}

impl PublicationState {
    /// Successor on the success path
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::BranchPending => Some(Self::BranchCreated),
            Self::BranchCreated => Some(Self::CommitPending),
            Self::CommitPending => Some(Self::CommitCreated),
            Self::CommitCreated => Some(Self::PrPending),
            Self::PrPending => Some(Self::Published),
            Self::Published | Self::Aborted => None,
        }
    }

    /// Whether no further transition is possible
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Published | Self::Aborted)
    }
}

impl std::fmt::Display for PublicationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::BranchPending => "branch pending",
            Self::BranchCreated => "branch created",
            Self::CommitPending => "commit pending",
            Self::CommitCreated => "commit created",
            Self::PrPending => "pull request pending",
            Self::Published => "published",
            Self::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Why a publication was aborted
#[derive(Debug, Error)]
pub enum PublishError {
    /// Branch refs could not be listed
    #[error("could not list branch refs: {0}")]
    Refs(#[source] HostingError),

    /// The default branch has no head ref to branch from
    #[error("default branch '{0}' has no head ref")]
    BaseRefMissing(String),

    /// The remote refused to create the branch
    #[error(
        "branch '{branch}' could not be created (HTTP {status}); it probably exists from an earlier run, delete it and rerun"
    )]
    BranchExistsOrConflict {
        /// Run-wide branch name
        branch: String,
        /// Status the remote answered with
        status: u16,
    },

    /// Branch creation failed without a remote answer
    #[error("branch creation failed: {0}")]
    Branch(#[source] HostingError),

    /// The file changed on the remote since it was read
    #[error("{path} changed since it was read (HTTP {status}); content hash no longer matches")]
    ContentConflict {
        /// Config path
        path: String,
        /// Status the remote answered with
        status: u16,
    },

    /// The content update failed for another reason
    #[error("commit failed: {0}")]
    Commit(#[source] HostingError),

    /// The pull request could not be opened
    #[error("pull request creation failed: {0}")]
    PullRequest(#[source] HostingError),
}

impl PublishError {
    /// HTTP status observed, if any
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::BranchExistsOrConflict { status, .. } | Self::ContentConflict { status, .. } => {
                Some(*status)
            },
            Self::Refs(e) | Self::Branch(e) | Self::Commit(e) | Self::PullRequest(e) => e.status(),
            Self::BaseRefMissing(_) => None,
        }
    }
}

/// Fixed, run-wide publication settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishSettings {
    /// Branch created in every repository
    pub branch: String,
    /// Path of the CI config inside the repository
    pub config_path: String,
    /// Commit message of the content update
    pub commit_message: String,
    /// Pull request title
    pub pr_title: String,
    /// Pull request description
    pub pr_body: String,
}

/// Identifiers of a successful publication
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Published {
    /// Branch carrying the change
    pub branch: String,
    /// Commit created on the branch
    pub commit_sha: String,
    /// Web URL of the pull request
    pub pr_url: String,
    /// States visited
    pub trail: Vec<PublicationState>,
}

/// An aborted publication
#[derive(Debug, Error)]
#[error("aborted while {stage}: {error}")]
pub struct PublicationAbort {
    /// State in which the failing step ran
    pub stage: PublicationState,
    /// The failure
    #[source]
    pub error: PublishError,
    /// States visited, ending in [`PublicationState::Aborted`]
    pub trail: Vec<PublicationState>,
}

/// Tracks the state of one publication
#[derive(Debug)]
struct Publication {
    state: PublicationState,
    trail: Vec<PublicationState>,
}

impl Publication {
    fn new() -> Self {
        Self {
            state: PublicationState::BranchPending,
            trail: vec![PublicationState::BranchPending],
        }
    }

    fn advance(&mut self) {
        if let Some(next) = self.state.next() {
            self.state = next;
            self.trail.push(next);
        }
    }

    fn abort(&mut self, error: PublishError) -> PublicationAbort {
        let stage = self.state;
        self.state = PublicationState::Aborted;
        self.trail.push(PublicationState::Aborted);
        PublicationAbort {
            stage,
            error,
            trail: std::mem::take(&mut self.trail),
        }
    }
}

/// Runs the publication pipeline against a hosting API
#[derive(Clone, Copy)]
pub struct Publisher<'a> {
    api: &'a dyn HostingApi,
    settings: &'a PublishSettings,
}

impl std::fmt::Debug for Publisher<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Publisher").field("settings", &self.settings).finish_non_exhaustive()
    }
}

impl<'a> Publisher<'a> {
    /// Create a publisher
    #[must_use]
    pub const fn new(api: &'a dyn HostingApi, settings: &'a PublishSettings) -> Self {
        Self { api, settings }
    }

    /// Branch, commit `content` (read at revision `base_sha`) and open a pull request
    pub fn publish(
        &self,
        repo: &Repository,
        base_sha: &str,
        content: &str,
    ) -> Result<Published, PublicationAbort> {
        let mut flow = Publication::new();

        self.create_branch(repo).map_err(|e| flow.abort(e))?;
        info!("{repo}: branch '{}' created", self.settings.branch);
        flow.advance();

        flow.advance();
        let commit_sha = self.commit(repo, base_sha, content).map_err(|e| flow.abort(e))?;
        info!("{repo}: {} updated in commit {commit_sha}", self.settings.config_path);
        flow.advance();

        flow.advance();
        let pr_url = self.open_pull_request(repo).map_err(|e| flow.abort(e))?;
        info!("{repo}: pull request opened: {pr_url}");
        flow.advance();

        Ok(Published {
            branch: self.settings.branch.clone(),
            commit_sha,
            pr_url,
            trail: flow.trail,
        })
    }

    fn create_branch(&self, repo: &Repository) -> Result<(), PublishError> {
        let refs = self.api.list_branch_refs(repo).map_err(PublishError::Refs)?;
        let base = refs
            .iter()
            .find(|r| r.branch_name() == repo.default_branch)
            .ok_or_else(|| PublishError::BaseRefMissing(repo.default_branch.clone()))?;
        debug!("{repo}: branching from {} at {}", base.name, base.sha);

        self.api.create_branch(repo, &self.settings.branch, &base.sha).map_err(|e| match e {
            HostingError::Status { status, .. } => PublishError::BranchExistsOrConflict {
                branch: self.settings.branch.clone(),
                status,
            },
            other => PublishError::Branch(other),
        })
    }

    fn commit(&self, repo: &Repository, base_sha: &str, content: &str) -> Result<String, PublishError> {
        let update = FileUpdate {
            path: self.settings.config_path.clone(),
            branch: self.settings.branch.clone(),
            message: self.settings.commit_message.clone(),
            content: content.to_string(),
            base_sha: base_sha.to_string(),
        };
        self.api.update_file(repo, &update).map_err(|e| match e.status() {
            Some(status) if e.is_conflict() => PublishError::ContentConflict {
                path: update.path.clone(),
                status,
            },
            _ => PublishError::Commit(e),
        })
    }

    fn open_pull_request(&self, repo: &Repository) -> Result<String, PublishError> {
        let draft = PullRequestDraft {
            title: self.settings.pr_title.clone(),
            body: self.settings.pr_body.clone(),
            head: self.settings.branch.clone(),
            base: repo.default_branch.clone(),
        };
        self.api.create_pull_request(repo, &draft).map_err(PublishError::PullRequest)
    }
}
