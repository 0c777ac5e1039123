//! Run configuration
//!
//! Settings are read from a TOML file and then overridden by command-line
//! flags. Lookup order for the file:
//!
//! 1. `--config <path>` (must exist)
//! 2. `./image-updater.toml`
//! 3. `~/.config/image-updater/config.toml` (XDG standard)
//!
//! Without any file the defaults below apply.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::adapters::github::DEFAULT_API_URL;
use crate::core::models::DeprecationRegistry;
use crate::core::services::PublishSettings;

/// Project-local config filename
pub const LOCAL_CONFIG_FILE: &str = "image-updater.toml";

/// Default location of the CI config inside a repository
pub const DEFAULT_CONFIG_PATH: &str = ".circleci/config.yml";

/// Settings for one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Organization to scan
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    /// API root URL
    pub api_url: String,
    /// Branch created in every repository (must not exist yet)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    /// CI config path inside each repository
    pub config_path: String,
    /// Directory receiving the patched copies
    pub output_dir: PathBuf,
    /// Extra deprecated images, added to the built-in list
    pub deprecated_images: Vec<String>,
    /// Commit message of the content update
    pub commit_message: String,
    /// Pull request title
    pub pr_title: String,
    /// Pull request description
    pub pr_body: String,
    /// HTTP timeout in seconds (unset: wait indefinitely)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            organization: None,
            api_url: DEFAULT_API_URL.to_string(),
            branch: None,
            config_path: DEFAULT_CONFIG_PATH.to_string(),
            output_dir: PathBuf::from("."),
            deprecated_images: Vec::new(),
            commit_message: "Automatic image update for deprecated images.".to_string(),
            pr_title: "Update deprecated image tags".to_string(),
            pr_body: "This PR is opened by a script, designed to help bulk update deprecated image tags."
                .to_string(),
            timeout_secs: None,
        }
    }
}

impl RunConfig {
    /// Path of the user-level config file
    #[must_use]
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("image-updater").join("config.toml"))
    }

    /// Parse TOML text
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load a specific file
    pub fn load_file(path: &Path) -> anyhow::Result<Self> {
        let content =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("parsing {}", path.display()))
    }

    /// Load following the lookup order
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        if let Some(path) = explicit {
            return Self::load_file(path);
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            return Self::load_file(&local);
        }

        match Self::global_config_path() {
            Some(global) if global.exists() => Self::load_file(&global),
            _ => Ok(Self::default()),
        }
    }

    /// Built-in deprecated images plus the configured extras
    #[must_use]
    pub fn registry(&self) -> DeprecationRegistry {
        DeprecationRegistry::builtin_with(self.deprecated_images.iter().cloned())
    }

    /// Publication settings for a run on `branch`
    #[must_use]
    pub fn publish_settings(&self, branch: &str) -> PublishSettings {
        PublishSettings {
            branch: branch.to_string(),
            config_path: self.config_path.clone(),
            commit_message: self.commit_message.clone(),
            pr_title: self.pr_title.clone(),
            pr_body: self.pr_body.clone(),
        }
    }
}
