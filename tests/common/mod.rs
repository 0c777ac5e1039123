//! Common test utilities shared across test types
//!
//! - `fixtures.rs` - CI config samples and YAML helpers
//! - `mocks.rs` - Recording hosting API and scripted tag answers

pub mod fixtures;
