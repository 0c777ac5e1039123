//! Audit artifact port
//!
//! Every patched document is saved locally before publication, so the
//! operator can inspect or resubmit it whatever the remote outcome.

use std::path::PathBuf;

/// Destination for patched documents
pub trait AuditStore {
    /// Persist `content` for `repo_name`; returns where it was written
    fn save(&self, repo_name: &str, content: &str) -> anyhow::Result<PathBuf>;
}
