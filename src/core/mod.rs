//! Core data structures for berth.
//!
//! - Units and their kinds (contracts, tests, the interface registry)
//! - Declarations extracted from unit sources
//! - Interface definitions and the registry
//! - Deployment manifests

pub mod declaration;
pub mod interface;
pub mod manifest;
pub mod unit;

pub use declaration::{Declaration, DeclarationRecord, FunctionDef, InterfaceRef, InvokeTarget};
pub use interface::{InterfaceDefinition, InterfaceRegistry, Signature};
pub use manifest::{DeploymentManifest, ManifestEntry, ManifestError, ManifestSections, Partition};
pub use unit::{Unit, UnitKind};
