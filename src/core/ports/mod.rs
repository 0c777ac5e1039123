//! Port traits (interfaces) for external dependencies
//!
//! These traits define the boundaries between the core logic and external
//! systems (the hosting API, the operator's terminal, the local filesystem).
//!
//! Implementations live in the `adapters` module.
//!
//! ## Design Principle
//!
//! The core depends only on these traits, never on concrete
//! implementations, so the whole per-repository pipeline runs against
//! test doubles.

mod audit_store;
mod hosting;
mod tag_source;

pub use audit_store::AuditStore;
#[cfg(test)]
pub use hosting::MockHostingApi;
pub use hosting::{FileUpdate, HostingApi, HostingError, PullRequestDraft, RemoteFile};
pub use tag_source::{FixedTag, TagSource};
