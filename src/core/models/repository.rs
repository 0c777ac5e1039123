//! Repository model
//!
//! A repository as reported by the organization listing. Immutable for the
//! duration of a run.

use serde::{Deserialize, Serialize};

/// A repository inside the scanned organization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    /// Repository name (e.g., "svc-a")
    pub name: String,

    /// Owning organization login
    pub owner: String,

    /// Name of the primary branch, base for new branches and pull requests
    pub default_branch: String,
}

impl Repository {
    /// Create a repository record
    pub fn new(
        owner: impl Into<String>,
        name: impl Into<String>,
        default_branch: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            owner: owner.into(),
            default_branch: default_branch.into(),
        }
    }
}

impl std::fmt::Display for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// A branch head reference (`refs/heads/...`) and the commit it points at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchRef {
    /// Fully qualified ref name, e.g. `refs/heads/main`
    pub name: String,

    /// Commit hash the ref points at
    pub sha: String,
}

impl BranchRef {
    /// Short branch name with the `refs/heads/` prefix removed
    #[must_use]
    pub fn branch_name(&self) -> &str {
        self.name.strip_prefix("refs/heads/").unwrap_or(&self.name)
    }
}
