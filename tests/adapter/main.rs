//! Adapter tests
//!
//! Tests for I/O adapter implementations:
//! - GitHub REST client, against a local HTTP server
