//! Domain models for image-updater
//!
//! Pure data structures with no I/O dependencies.
//!
//! - [`Repository`] - A repository of the scanned organization
//! - [`DeprecationRegistry`] - The set of obsolete `family:version` images
//! - [`CiConfigDocument`] - A fetched CI config, parsed, with its content hash

mod document;
mod image;
mod repository;
mod yaml_source;

pub use document::{CiConfigDocument, DocumentError, IMAGE_KEY, ImagePosition, JOBS_KEY, MACHINE_KEY};
pub use image::{
    BUILTIN_DEPRECATED_IMAGES, DEFAULT_TAG, DeprecationRegistry, image_family, replacement_image,
};
pub use repository::{BranchRef, Repository};
