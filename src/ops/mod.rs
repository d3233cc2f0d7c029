//! High-level operations.
//!
//! This module contains the implementation of berth commands.

pub mod align;
pub mod analyze;
pub mod conformance;
pub mod coverage;
pub mod issue;
pub mod order;
pub mod prune;

pub use align::{align_manifest, align_manifests, AlignOptions, AlignOutcome};
pub use analyze::{analyze, check, Analysis, CheckOptions, CheckReport};
pub use conformance::check_conformance;
pub use coverage::manifest_coverage;
pub use issue::{tally, Finding, Issue};
pub use order::{
    combined_dependencies, configured_manifests, deployment_order, load_manifests,
};
pub use prune::{prune_manifest, prune_manifests, PruneOptions, PruneOutcome, Removal};
