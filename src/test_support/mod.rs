//! Test utilities for berth unit tests.
//!
//! # Example
//!
//! ```rust,ignore
//! use berth::test_support::ProjectFixture;
//!
//! #[test]
//! fn test_example() {
//!     let project = ProjectFixture::new()
//!         .contract("a", "")
//!         .contract("b", "(contract-call? .a f)");
//!     let ctx = project.context();
//!     // Run operations against ctx...
//! }
//! ```

pub mod fixtures;

pub use fixtures::*;
