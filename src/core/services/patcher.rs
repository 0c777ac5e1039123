//! Patch engine - replace deprecated images in a document
//!
//! Pure logic over the structured document. Replacement tags come from a
//! [`TagSource`], so no terminal is involved when testing.

use log::{info, warn};
use serde::Serialize;

use crate::core::models::{CiConfigDocument, DeprecationRegistry, ImagePosition, replacement_image};
use crate::core::ports::TagSource;

use super::resolver::Resolution;

/// One applied replacement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageChange {
    /// Job name
    pub job: String,
    /// Image before the patch
    pub old_image: String,
    /// Image after the patch
    pub new_image: String,
    /// Position that was rewritten
    pub position: ImagePosition,
}

/// Result of patching one document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PatchResult {
    /// Replacements applied, in document order
    pub changes: Vec<ImageChange>,
}

impl PatchResult {
    /// Whether the document was modified
    #[must_use]
    pub fn changed(&self) -> bool {
        !self.changes.is_empty()
    }
}

/// Replace every deprecated image found in `resolution`
///
/// Images not present verbatim in `registry` are left alone. The new value is
/// written at the position the old one was found. Anomalous jobs are logged
/// and skipped.
pub fn patch_document(
    repo: &str,
    doc: &mut CiConfigDocument,
    resolution: &Resolution,
    registry: &DeprecationRegistry,
    tags: &mut dyn TagSource,
) -> anyhow::Result<PatchResult> {
    for anomaly in &resolution.anomalies {
        warn!("{repo}: skipping job '{}': {}", anomaly.job, anomaly.reason);
    }

    let mut result = PatchResult::default();
    for found in &resolution.images {
        if !registry.is_deprecated(&found.image) {
            continue;
        }

        let tag = tags.replacement_tag(repo, &found.job, &found.image)?;
        let new_image = replacement_image(&found.image, &tag);
        if new_image == found.image {
            continue;
        }

        if doc.set_image(&found.job, found.position, &new_image)? {
            info!("{repo}: job '{}' updating from {} to {new_image}", found.job, found.image);
            result.changes.push(ImageChange {
                job: found.job.clone(),
                old_image: found.image.clone(),
                new_image,
                position: found.position,
            });
        } else {
            warn!("{repo}: job '{}' lost its {} field while patching", found.job, found.position);
        }
    }

    Ok(result)
}
