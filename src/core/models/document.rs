//! CI config document
//!
//! The fetched YAML content, kept both as its original text and as a parsed
//! value, together with the remote content hash needed for the
//! optimistic-concurrency write and the raw byte length. Reads go through the
//! parsed value. An edit replaces only the edited scalar in the text and is
//! accepted once the text parses back to the expected value.

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use thiserror::Error;

use super::yaml_source::{ScalarStyle, locate_scalar, render_scalar};

/// Key holding the job collection
pub const JOBS_KEY: &str = "jobs";

/// Key declaring a machine executor
pub const MACHINE_KEY: &str = "machine";

/// Key holding the image identifier
pub const IMAGE_KEY: &str = "image";

/// Where inside a job the image field lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImagePosition {
    /// `jobs.<name>.image`, beside the `machine` key
    TopLevel,
    /// `jobs.<name>.machine.image`
    Nested,
}

impl std::fmt::Display for ImagePosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TopLevel => write!(f, "image"),
            Self::Nested => write!(f, "machine.image"),
        }
    }
}

/// Why an image field could not be rewritten
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The field is not written as a plain or quoted scalar on its own line
    #[error("job '{job}': {position} is not a single-line scalar in the source text")]
    Unlocatable {
        /// Job name
        job: String,
        /// Field position
        position: ImagePosition,
    },

    /// Rewriting the scalar would change more than that one field
    #[error("job '{job}': rewriting {position} would alter other content")]
    Diverged {
        /// Job name
        job: String,
        /// Field position
        position: ImagePosition,
    },
}

/// A parsed CI config plus its remote metadata
#[derive(Debug, Clone, PartialEq)]
pub struct CiConfigDocument {
    source: String,
    value: Value,
    sha: String,
    size: usize,
}

impl CiConfigDocument {
    /// Parse YAML text fetched from the remote
    pub fn parse(content: &str, sha: impl Into<String>) -> Result<Self, serde_yaml::Error> {
        let value: Value = serde_yaml::from_str(content)?;
        Ok(Self {
            source: content.to_string(),
            value,
            sha: sha.into(),
            size: content.len(),
        })
    }

    /// Remote content hash of the fetched revision
    #[must_use]
    pub fn sha(&self) -> &str {
        &self.sha
    }

    /// Raw length in bytes of the fetched content
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// The structured document
    #[must_use]
    pub const fn value(&self) -> &Value {
        &self.value
    }

    /// The `jobs` mapping, if the document has one
    #[must_use]
    pub fn jobs(&self) -> Option<&Mapping> {
        self.value.get(JOBS_KEY).and_then(Value::as_mapping)
    }

    /// Whether any job declares a `machine` block
    #[must_use]
    pub fn has_machine_directive(&self) -> bool {
        self.jobs().is_some_and(|jobs| {
            jobs.values().any(|job| job.get(MACHINE_KEY).is_some())
        })
    }

    /// Current image string of a job at the given position
    #[must_use]
    pub fn image_at(&self, job: &str, position: ImagePosition) -> Option<&str> {
        let job = self.value.get(JOBS_KEY)?.get(job)?;
        let slot = match position {
            ImagePosition::TopLevel => job.get(IMAGE_KEY),
            ImagePosition::Nested => job.get(MACHINE_KEY).and_then(|m| m.get(IMAGE_KEY)),
        };
        slot.and_then(Value::as_str)
    }

    /// Overwrite an existing image field in place
    ///
    /// Returns `Ok(false)` when the field does not exist at that position; the
    /// shape of the document is never changed. Every byte outside the old
    /// scalar is kept, and the quoting style of the old scalar is reused when
    /// it can hold the new value.
    pub fn set_image(
        &mut self,
        job: &str,
        position: ImagePosition,
        image: &str,
    ) -> Result<bool, DocumentError> {
        let mut expected = self.value.clone();
        match image_slot(&mut expected, job, position) {
            Some(slot) => *slot = Value::String(image.to_string()),
            None => return Ok(false),
        }

        let path = match position {
            ImagePosition::TopLevel => vec![JOBS_KEY, job, IMAGE_KEY],
            ImagePosition::Nested => vec![JOBS_KEY, job, MACHINE_KEY, IMAGE_KEY],
        };
        let span = locate_scalar(&self.source, &path).ok_or_else(|| DocumentError::Unlocatable {
            job: job.to_string(),
            position,
        })?;

        let mut styles = vec![span.style];
        if span.style == ScalarStyle::Plain {
            styles.push(ScalarStyle::DoubleQuoted);
        }
        for style in styles {
            let mut candidate = self.source.clone();
            candidate.replace_range(span.range.clone(), &render_scalar(image, style));
            if serde_yaml::from_str::<Value>(&candidate).is_ok_and(|value| value == expected) {
                self.source = candidate;
                self.value = expected;
                return Ok(true);
            }
        }

        Err(DocumentError::Diverged {
            job: job.to_string(),
            position,
        })
    }

    /// The document as YAML text, including every edit applied so far
    #[must_use]
    pub fn as_yaml(&self) -> &str {
        &self.source
    }
}

fn image_slot<'v>(value: &'v mut Value, job: &str, position: ImagePosition) -> Option<&'v mut Value> {
    let job = value.get_mut(JOBS_KEY)?.get_mut(job)?;
    match position {
        ImagePosition::TopLevel => job.get_mut(IMAGE_KEY),
        ImagePosition::Nested => job.get_mut(MACHINE_KEY)?.get_mut(IMAGE_KEY),
    }
}
