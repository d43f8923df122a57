//! Architectural Enforcement Integration Tests
//!
//! This package contains integration tests that enforce architectural
//! principles:
//! - The core crate stays free of UI framework dependencies
//! - Error propagation instead of panicking in production code
//!
//! These tests are designed to catch violations early in the development
//! cycle.

use std::path::PathBuf;

/// Locate a workspace member's `src` directory relative to this package
#[must_use]
pub fn workspace_src(member: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../..")
        .join(member)
        .join("src")
}
