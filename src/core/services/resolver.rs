//! Image resolver - find the image of every machine job
//!
//! A machine job carries its image either beside the `machine` key or one
//! level under it. The top-level position wins when both exist.

use serde::Serialize;

use crate::core::models::{CiConfigDocument, IMAGE_KEY, ImagePosition, MACHINE_KEY};

/// Image reference of one machine job
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobImage {
    /// Job name (key in `jobs`)
    pub job: String,
    /// Current image identifier
    pub image: String,
    /// Where the identifier lives
    pub position: ImagePosition,
}

/// A machine job whose image could not be resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobAnomaly {
    /// Job name
    pub job: String,
    /// What was wrong
    pub reason: String,
}

/// Resolved images and skipped jobs of one document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Resolution {
    /// Machine jobs with a resolvable image, in document order
    pub images: Vec<JobImage>,
    /// Machine jobs that were skipped
    pub anomalies: Vec<JobAnomaly>,
}

/// Locate the image of every job that declares a machine block
///
/// Jobs without a `machine` key are not machine jobs and are ignored.
#[must_use]
pub fn resolve_images(doc: &CiConfigDocument) -> Resolution {
    let mut resolution = Resolution::default();
    let Some(jobs) = doc.jobs() else {
        return resolution;
    };

    for (name, job) in jobs {
        let Some(machine) = job.get(MACHINE_KEY) else {
            continue;
        };
        let Some(job_name) = name.as_str().map(String::from) else {
            resolution.anomalies.push(JobAnomaly {
                job: format!("{name:?}"),
                reason: "job name is not a string".to_string(),
            });
            continue;
        };

        let found = job
            .get(IMAGE_KEY)
            .map(|image| (image, ImagePosition::TopLevel))
            .or_else(|| machine.get(IMAGE_KEY).map(|image| (image, ImagePosition::Nested)));

        match found {
            Some((image, position)) => match image.as_str() {
                Some(image) => resolution.images.push(JobImage {
                    job: job_name,
                    image: image.to_string(),
                    position,
                }),
                None => resolution.anomalies.push(JobAnomaly {
                    job: job_name,
                    reason: format!("{position} is not a string"),
                }),
            },
            None => resolution.anomalies.push(JobAnomaly {
                job: job_name,
                reason: "machine block without an image".to_string(),
            }),
        }
    }

    resolution
}
