//! Core logic for image-updater
//!
//! This module contains the pipeline logic with no direct I/O.
//! All external interactions are abstracted through port traits.
//!
//! ## Architecture
//!
//! - `models/` - Domain types (Repository, DeprecationRegistry, CiConfigDocument)
//! - `services/` - The detect, patch and publish pipeline
//! - `ports/` - Trait definitions for external dependencies

pub mod models;
pub mod ports;
pub mod services;
