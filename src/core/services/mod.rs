//! Business logic services
//!
//! The per-repository pipeline, leaf first:
//!
//! - [`locator`] - Fetch the CI config and check it declares a machine executor
//! - [`resolver`] - Find the image of every machine job
//! - [`patcher`] - Replace deprecated images in place
//! - [`publisher`] - Branch, commit, pull request
//! - [`orchestrator`] - Drive all repositories, isolate failures

pub mod locator;
pub mod orchestrator;
pub mod patcher;
pub mod publisher;
pub mod resolver;

pub use locator::{ConfigLookup, LocateError, locate_config};
pub use orchestrator::{Orchestrator, RepoOutcome, RepoReport, RunError, RunReport};
pub use patcher::{ImageChange, PatchResult, patch_document};
pub use publisher::{
    PublicationAbort, PublicationState, PublishError, PublishSettings, Published, Publisher,
};
pub use resolver::{JobAnomaly, JobImage, Resolution, resolve_images};
