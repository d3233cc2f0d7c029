//! Reading unit sources: comment stripping, tokenizing, declaration
//! extraction and indexing of the source tree.

pub mod extract;
pub mod index;
pub mod lexer;
pub mod strip;

pub use index::{IndexIssue, IndexOptions, SourceIndex, SourceUnit};
