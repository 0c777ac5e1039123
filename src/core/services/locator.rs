//! Config locator - fetch the CI config of one repository
//!
//! A repository is applicable only when the config exists on its default
//! branch and declares at least one machine executor.

use log::debug;
use thiserror::Error;

use crate::core::models::{CiConfigDocument, Repository};
use crate::core::ports::{HostingApi, HostingError};

/// Errors that stop the config of one repository from being read
#[derive(Debug, Error)]
pub enum LocateError {
    /// The remote call failed for a reason other than "not found"
    #[error("could not read {path}: {source}")]
    Fetch {
        /// Config path
        path: String,
        /// Underlying API failure
        #[source]
        source: HostingError,
    },

    /// The file is not valid YAML
    #[error("{path} is not valid YAML: {source}")]
    Parse {
        /// Config path
        path: String,
        /// Parser error
        #[source]
        source: serde_yaml::Error,
    },
}

/// Outcome of looking for a repository's CI config
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigLookup {
    /// Config present with at least one machine directive
    Found(CiConfigDocument),
    /// No config file at the path
    Absent,
    /// Config present but no job declares a machine executor
    NoMachineDirective,
}

/// Fetch and parse the config at `path` from the repository's default branch
pub fn locate_config(
    api: &dyn HostingApi,
    repo: &Repository,
    path: &str,
) -> Result<ConfigLookup, LocateError> {
    let file = api.get_file(repo, path).map_err(|source| LocateError::Fetch {
        path: path.to_string(),
        source,
    })?;

    let Some(file) = file else {
        return Ok(ConfigLookup::Absent);
    };

    let document =
        CiConfigDocument::parse(&file.content, file.sha).map_err(|source| LocateError::Parse {
            path: path.to_string(),
            source,
        })?;
    debug!("{repo}: read {path} ({} bytes, sha {})", document.size(), document.sha());

    if document.has_machine_directive() {
        Ok(ConfigLookup::Found(document))
    } else {
        Ok(ConfigLookup::NoMachineDirective)
    }
}
