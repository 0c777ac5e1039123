//! Local audit copies of patched documents
//!
//! One `<repo>.yml` per modified repository, written before publication and
//! never removed.

use std::fs;
use std::path::PathBuf;

use anyhow::Context;

use crate::core::ports::AuditStore;

/// Writes patched documents into a directory
#[derive(Debug, Clone)]
pub struct FileAuditStore {
    dir: PathBuf,
}

impl FileAuditStore {
    /// Store files under `dir` (created on first write)
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path used for a repository
    #[must_use]
    pub fn path_for(&self, repo_name: &str) -> PathBuf {
        let file_name: String = repo_name
            .chars()
            .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
            .collect();
        self.dir.join(format!("{file_name}.yml"))
    }
}

impl AuditStore for FileAuditStore {
    fn save(&self, repo_name: &str, content: &str) -> anyhow::Result<PathBuf> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("creating {}", self.dir.display()))?;
        let path = self.path_for(repo_name);
        fs::write(&path, content).with_context(|| format!("writing {}", path.display()))?;
        Ok(path)
    }
}
