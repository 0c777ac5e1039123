//! Orchestrator - drive every repository of the organization through the pipeline
//!
//! Repositories are processed strictly one after another. Anything that goes
//! wrong inside one repository is logged, recorded in the [`RunReport`] and
//! processing continues with the next one. Only the initial enumeration can
//! abort the run.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use log::{error, info, warn};
use serde::Serialize;
use thiserror::Error;

use crate::core::models::{DeprecationRegistry, Repository};
use crate::core::ports::{AuditStore, HostingApi, HostingError, TagSource};

use super::locator::{ConfigLookup, locate_config};
use super::patcher::{ImageChange, patch_document};
use super::publisher::{PublicationState, PublishSettings, Publisher};
use super::resolver::resolve_images;

/// Conditions that abort the whole run
#[derive(Debug, Error)]
pub enum RunError {
    /// The organization could not be listed with the given credentials
    #[error(
        "organization '{organization}' is not valid, or the token has no access to it: {source}"
    )]
    Authorization {
        /// Organization that was requested
        organization: String,
        /// Underlying API failure
        #[source]
        source: HostingError,
    },

    /// A required input (organization, token, branch) was not provided
    #[error("missing required input: {0}")]
    MissingInput(String),
}

/// What happened to one repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RepoOutcome {
    /// Nothing to do here (no config, no machine directive, unreadable config)
    Skipped {
        /// Why the repository was skipped
        reason: String,
    },
    /// Config inspected, no deprecated image found
    Unchanged {
        /// Machine jobs skipped because their image could not be resolved
        anomalies: usize,
    },
    /// Patched and saved locally; remote writes disabled
    Saved {
        /// Replacements applied
        changes: Vec<ImageChange>,
        /// Local copy of the patched document
        audit_file: PathBuf,
    },
    /// Pull request opened
    Published {
        /// Replacements applied
        changes: Vec<ImageChange>,
        /// Local copy of the patched document
        audit_file: PathBuf,
        /// Commit carrying the change
        commit_sha: String,
        /// Web URL of the pull request
        pr_url: String,
    },
    /// Publication stopped part way
    Aborted {
        /// Replacements applied
        changes: Vec<ImageChange>,
        /// Local copy of the patched document
        audit_file: PathBuf,
        /// State in which the failing step ran
        stage: PublicationState,
        /// The failure
        error: String,
        /// Status the remote answered with, if any
        #[serde(skip_serializing_if = "Option::is_none")]
        http_status: Option<u16>,
    },
    /// Local failure before publication (prompt or audit file)
    Failed {
        /// The failure
        error: String,
    },
}

/// Outcome for one named repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoReport {
    /// Repository name
    pub repository: String,
    /// What happened
    #[serde(flatten)]
    pub outcome: RepoOutcome,
}

/// Outcome of a whole run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Scanned organization
    pub organization: String,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// Whether remote writes were disabled
    pub dry_run: bool,
    /// Per-repository outcomes in processing order
    pub repositories: Vec<RepoReport>,
}

impl RunReport {
    /// Number of pull requests opened
    #[must_use]
    pub fn published(&self) -> usize {
        self.count(|o| matches!(o, RepoOutcome::Published { .. }))
    }

    /// Number of publications that were aborted or failed locally
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, RepoOutcome::Aborted { .. } | RepoOutcome::Failed { .. }))
    }

    /// Number of repositories skipped or left unchanged
    #[must_use]
    pub fn untouched(&self) -> usize {
        self.count(|o| matches!(o, RepoOutcome::Skipped { .. } | RepoOutcome::Unchanged { .. }))
    }

    fn count(&self, pred: impl Fn(&RepoOutcome) -> bool) -> usize {
        self.repositories.iter().filter(|r| pred(&r.outcome)).count()
    }
}

/// Drives the per-repository pipeline over an organization
#[derive(Clone, Copy)]
pub struct Orchestrator<'a> {
    api: &'a dyn HostingApi,
    audit: &'a dyn AuditStore,
    registry: &'a DeprecationRegistry,
    settings: &'a PublishSettings,
    dry_run: bool,
}

impl std::fmt::Debug for Orchestrator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("registry", &self.registry)
            .field("settings", &self.settings)
            .field("dry_run", &self.dry_run)
            .finish_non_exhaustive()
    }
}

impl<'a> Orchestrator<'a> {
    /// Create an orchestrator
    #[must_use]
    pub const fn new(
        api: &'a dyn HostingApi,
        audit: &'a dyn AuditStore,
        registry: &'a DeprecationRegistry,
        settings: &'a PublishSettings,
    ) -> Self {
        Self {
            api,
            audit,
            registry,
            settings,
            dry_run: false,
        }
    }

    /// Patch and save locally, but make no remote writes
    #[must_use]
    pub const fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Process every repository of `organization`
    pub fn run(&self, organization: &str, tags: &mut dyn TagSource) -> Result<RunReport, RunError> {
        let started_at = Utc::now();
        let repos = self.api.list_repositories(organization).map_err(|source| {
            RunError::Authorization {
                organization: organization.to_string(),
                source,
            }
        })?;
        info!("{organization}: {} repositories to scan", repos.len());

        let mut repositories = Vec::with_capacity(repos.len());
        for repo in &repos {
            info!("====== Working on repo: {} ======", repo.name);
            let outcome = self.process_repository(repo, tags);
            repositories.push(RepoReport {
                repository: repo.name.clone(),
                outcome,
            });
        }

        Ok(RunReport {
            organization: organization.to_string(),
            started_at,
            dry_run: self.dry_run,
            repositories,
        })
    }

    /// Run detect, parse, patch and publish for one repository
    pub fn process_repository(&self, repo: &Repository, tags: &mut dyn TagSource) -> RepoOutcome {
        let path = &self.settings.config_path;
        let mut doc = match locate_config(self.api, repo, path) {
            Ok(ConfigLookup::Found(doc)) => doc,
            Ok(ConfigLookup::Absent) => {
                info!("{repo}: no {path} file found");
                return skipped(format!("no {path} file"));
            },
            Ok(ConfigLookup::NoMachineDirective) => {
                info!("{repo}: no \"machine:\" entry found");
                return skipped("no machine directive".to_string());
            },
            Err(e) => {
                warn!("{repo}: {e}");
                return skipped(e.to_string());
            },
        };

        let resolution = resolve_images(&doc);
        let patch = match patch_document(&repo.name, &mut doc, &resolution, self.registry, tags) {
            Ok(patch) => patch,
            Err(e) => {
                error!("{repo}: {e:#}");
                return RepoOutcome::Failed {
                    error: format!("{e:#}"),
                };
            },
        };

        if !patch.changed() {
            info!("{repo}: no changes triggered, moving to next repo");
            return RepoOutcome::Unchanged {
                anomalies: resolution.anomalies.len(),
            };
        }

        let content = doc.as_yaml();
        let audit_file = match self.audit.save(&repo.name, content) {
            Ok(path) => path,
            Err(e) => {
                error!("{repo}: could not save patched config: {e:#}");
                return RepoOutcome::Failed {
                    error: format!("{e:#}"),
                };
            },
        };
        info!("{repo}: patched config saved to {}", audit_file.display());

        if self.dry_run {
            return RepoOutcome::Saved {
                changes: patch.changes,
                audit_file,
            };
        }

        match Publisher::new(self.api, self.settings).publish(repo, doc.sha(), content) {
            Ok(published) => RepoOutcome::Published {
                changes: patch.changes,
                audit_file,
                commit_sha: published.commit_sha,
                pr_url: published.pr_url,
            },
            Err(abort) => {
                error!("{repo}: publication {abort}");
                RepoOutcome::Aborted {
                    changes: patch.changes,
                    audit_file,
                    stage: abort.stage,
                    http_status: abort.error.status(),
                    error: abort.error.to_string(),
                }
            },
        }
    }
}

fn skipped(reason: String) -> RepoOutcome {
    RepoOutcome::Skipped { reason }
}
