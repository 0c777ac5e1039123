//! Adapter implementations for port traits
//!
//! This module contains concrete implementations that handle I/O:
//!
//! - `github/` - GitHub REST client for the hosting port
//! - `terminal` - Operator prompts (organization, token, branch, tags)
//! - `audit` - Local copies of patched documents

pub mod audit;
pub mod github;
pub mod terminal;

pub use audit::FileAuditStore;
pub use github::{GitHubClient, GitHubClientConfig};
pub use terminal::{PromptTags, prompt_line, prompt_required};
