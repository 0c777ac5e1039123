//! GitHub REST adapter for the hosting port
//!
//! Blocking client for the six endpoints the pipeline needs. Every call
//! carries the token as a bearer credential; any non-success status is an
//! error, except a 404 on a file read which means "absent".

mod types;

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use log::debug;
use reqwest::{StatusCode, Url};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{self, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;

use crate::core::models::{BranchRef, Repository};
use crate::core::ports::{FileUpdate, HostingApi, HostingError, PullRequestDraft, RemoteFile};

use types::{
    ContentResponse, CreateRefRequest, PullRequestResponse, RefResponse, RepoResponse,
    UpdateContentRequest, UpdateContentResponse,
};

/// Public GitHub API root
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Page size requested from list endpoints
const PER_PAGE: &str = "100";

/// GitHub client configuration
#[derive(Debug, Clone)]
pub struct GitHubClientConfig {
    /// API root, e.g. `https://api.github.com` or a GitHub Enterprise `/api/v3` URL
    pub api_url: String,

    /// Personal access token
    pub token: String,

    /// Request timeout in seconds; `None` waits indefinitely
    pub timeout_secs: Option<u64>,
}

impl Default for GitHubClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: String::new(),
            timeout_secs: None,
        }
    }
}

/// Blocking GitHub API client
#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: Client,
    api_url: String,
}

impl GitHubClient {
    /// Build a client with authentication headers preset
    pub fn new(config: &GitHubClientConfig) -> Result<Self, HostingError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.token))
            .map_err(|e| HostingError::Transport(format!("invalid token: {e}")))?;
        auth.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, auth);
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static("2022-11-28"));

        let client = Client::builder()
            .default_headers(headers)
            .user_agent(concat!("image-updater/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout_secs.map(Duration::from_secs))
            .build()
            .map_err(|e| HostingError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.api_url, endpoint)
    }

    fn url_with(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<Url, HostingError> {
        Url::parse_with_params(&self.url(endpoint), params)
            .map_err(|e| HostingError::Transport(format!("invalid URL for {endpoint}: {e}")))
    }

    fn repo_endpoint(repo: &Repository, rest: &str) -> String {
        format!("repos/{}/{}/{rest}", repo.owner, repo.name)
    }

    /// Send a request and reject non-success statuses
    fn send(request: RequestBuilder, endpoint: &str) -> Result<Response, HostingError> {
        let response = request.send().map_err(|e| HostingError::Transport(e.to_string()))?;
        let status = response.status();
        debug!("{endpoint}: HTTP {}", status.as_u16());
        if status.is_success() {
            Ok(response)
        } else {
            Err(HostingError::Status {
                status: status.as_u16(),
                endpoint: endpoint.to_string(),
            })
        }
    }

    fn decode<T: DeserializeOwned>(response: Response, endpoint: &str) -> Result<T, HostingError> {
        response.json().map_err(|e| HostingError::Decode {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })
    }

    /// GET every page of a list endpoint, following `Link: rel="next"`
    fn get_all<T: DeserializeOwned>(&self, endpoint: &str) -> Result<Vec<T>, HostingError> {
        let mut items = Vec::new();
        let mut request = self.client.get(self.url_with(endpoint, &[("per_page", PER_PAGE)])?);
        loop {
            let response = Self::send(request, endpoint)?;
            let next = response
                .headers()
                .get(header::LINK)
                .and_then(|v| v.to_str().ok())
                .and_then(next_page_url);
            let page: Vec<T> = Self::decode(response, endpoint)?;
            items.extend(page);
            match next {
                Some(url) => request = self.client.get(url),
                None => return Ok(items),
            }
        }
    }

    fn fetch_raw(&self, url: &str, endpoint: &str) -> Result<String, HostingError> {
        let response = Self::send(self.client.get(url), endpoint)?;
        response.text().map_err(|e| HostingError::Decode {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })
    }
}

impl HostingApi for GitHubClient {
    fn list_repositories(&self, organization: &str) -> Result<Vec<Repository>, HostingError> {
        let repos: Vec<RepoResponse> = self.get_all(&format!("orgs/{organization}/repos"))?;
        Ok(repos.into_iter().map(RepoResponse::into_repository).collect())
    }

    fn get_file(&self, repo: &Repository, path: &str) -> Result<Option<RemoteFile>, HostingError> {
        let endpoint = Self::repo_endpoint(repo, &format!("contents/{path}"));
        let request =
            self.client.get(self.url_with(&endpoint, &[("ref", repo.default_branch.as_str())])?);
        let response = match Self::send(request, &endpoint) {
            Ok(response) => response,
            Err(HostingError::Status { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                return Ok(None);
            },
            Err(e) => return Err(e),
        };
        let file: ContentResponse = Self::decode(response, &endpoint)?;

        // Files over 1 MB come back without inline content.
        let content = match file.inline_content() {
            Some(encoded) => decode_content(&encoded).map_err(|message| HostingError::Decode {
                endpoint: endpoint.clone(),
                message,
            })?,
            None => match file.download_url.as_deref() {
                Some(url) => self.fetch_raw(url, &endpoint)?,
                None => {
                    return Err(HostingError::Decode {
                        endpoint,
                        message: "no content and no download_url".to_string(),
                    });
                },
            },
        };

        Ok(Some(RemoteFile {
            content,
            sha: file.sha,
        }))
    }

    fn list_branch_refs(&self, repo: &Repository) -> Result<Vec<BranchRef>, HostingError> {
        let refs: Vec<RefResponse> = self.get_all(&Self::repo_endpoint(repo, "git/refs/heads"))?;
        Ok(refs.into_iter().map(RefResponse::into_branch_ref).collect())
    }

    fn create_branch(&self, repo: &Repository, branch: &str, sha: &str) -> Result<(), HostingError> {
        let endpoint = Self::repo_endpoint(repo, "git/refs");
        let body = CreateRefRequest {
            r#ref: format!("refs/heads/{branch}"),
            sha: sha.to_string(),
        };
        Self::send(self.client.post(self.url(&endpoint)).json(&body), &endpoint)?;
        Ok(())
    }

    fn update_file(&self, repo: &Repository, update: &FileUpdate) -> Result<String, HostingError> {
        let endpoint = Self::repo_endpoint(repo, &format!("contents/{}", update.path));
        let body = UpdateContentRequest {
            message: update.message.clone(),
            content: STANDARD.encode(update.content.as_bytes()),
            sha: update.base_sha.clone(),
            branch: update.branch.clone(),
        };
        let response = Self::send(self.client.put(self.url(&endpoint)).json(&body), &endpoint)?;
        let created: UpdateContentResponse = Self::decode(response, &endpoint)?;
        Ok(created.commit.sha)
    }

    fn create_pull_request(
        &self,
        repo: &Repository,
        draft: &PullRequestDraft,
    ) -> Result<String, HostingError> {
        let endpoint = Self::repo_endpoint(repo, "pulls");
        let response = Self::send(self.client.post(self.url(&endpoint)).json(draft), &endpoint)?;
        let pr: PullRequestResponse = Self::decode(response, &endpoint)?;
        Ok(pr.html_url)
    }
}

/// Decode base64 file content as returned by the contents endpoint
///
/// GitHub wraps the encoded text at 60 columns, so whitespace is dropped first.
pub fn decode_content(encoded: &str) -> Result<String, String> {
    let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = STANDARD.decode(compact).map_err(|e| format!("invalid base64 content: {e}"))?;
    String::from_utf8(bytes).map_err(|e| format!("content is not UTF-8: {e}"))
}

/// Extract the `rel="next"` URL from a `Link` header
#[must_use]
pub fn next_page_url(link: &str) -> Option<String> {
    link.split(',').find_map(|part| {
        let mut pieces = part.split(';').map(str::trim);
        let url = pieces.next()?.strip_prefix('<')?.strip_suffix('>')?;
        pieces.any(|p| p == "rel=\"next\"").then(|| url.to_string())
    })
}
