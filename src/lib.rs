//! berth - dependency graphs and deployment ordering for contract sources
//!
//! This crate indexes a tree of Clarity-style unit sources, builds the
//! system dependency graph from their trait and call declarations, detects
//! cycles, derives a deployment order and keeps deployment manifests aligned
//! with it.

pub mod core;
pub mod graph;
pub mod ops;
pub mod order;
pub mod source;
pub mod util;

/// Test utilities for berth unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides an on-disk project fixture builder.
#[cfg(test)]
pub mod test_support;

pub use crate::core::{manifest::DeploymentManifest, unit::Unit};
pub use graph::Graph;
pub use order::{CycleError, DeploymentOrder};
pub use source::SourceIndex;
pub use util::context::GlobalContext;
