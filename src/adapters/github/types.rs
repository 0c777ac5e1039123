//! Request and response bodies of the GitHub REST endpoints used

use serde::{Deserialize, Serialize};

use crate::core::models::{BranchRef, Repository};

#[derive(Debug, Deserialize)]
pub(super) struct OwnerResponse {
    pub login: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct RepoResponse {
    pub name: String,
    pub owner: OwnerResponse,
    #[serde(default = "default_branch")]
    pub default_branch: String,
}

fn default_branch() -> String {
    "main".to_string()
}

impl RepoResponse {
    pub(super) fn into_repository(self) -> Repository {
        Repository {
            name: self.name,
            owner: self.owner.login,
            default_branch: self.default_branch,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct ContentResponse {
    pub sha: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub encoding: Option<String>,
    #[serde(default)]
    pub download_url: Option<String>,
}

impl ContentResponse {
    /// Base64 content when it was sent inline
    pub(super) fn inline_content(&self) -> Option<String> {
        match (self.encoding.as_deref(), self.content.as_deref()) {
            (Some("base64"), Some(content)) if !content.is_empty() => Some(content.to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct RefObject {
    pub sha: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct RefResponse {
    #[serde(rename = "ref")]
    pub name: String,
    pub object: RefObject,
}

impl RefResponse {
    pub(super) fn into_branch_ref(self) -> BranchRef {
        BranchRef {
            name: self.name,
            sha: self.object.sha,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct CreateRefRequest {
    pub r#ref: String,
    pub sha: String,
}

#[derive(Debug, Serialize)]
pub(super) struct UpdateContentRequest {
    pub message: String,
    pub content: String,
    pub sha: String,
    pub branch: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct CommitInfo {
    pub sha: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct UpdateContentResponse {
    pub commit: CommitInfo,
}

#[derive(Debug, Deserialize)]
pub(super) struct PullRequestResponse {
    pub html_url: String,
}
