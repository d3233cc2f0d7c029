//! Deployable units.
//!
//! A unit is a single contract, test, or the interface registry, identified
//! by the stem of its source file.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// The kind of a deployable unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitKind {
    /// A contract under the contracts tree
    Contract,
    /// A unit under the tests tree
    Test,
    /// The canonical interface registry
    Interface,
}

impl UnitKind {
    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitKind::Contract => "contract",
            UnitKind::Test => "test",
            UnitKind::Interface => "interface",
        }
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A deployable unit discovered on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Unit {
    id: String,
    kind: UnitKind,
    source_path: PathBuf,
}

impl Unit {
    /// Create a new unit.
    pub fn new(id: impl Into<String>, kind: UnitKind, source_path: impl Into<PathBuf>) -> Self {
        Unit {
            id: id.into(),
            kind,
            source_path: source_path.into(),
        }
    }

    /// Derive the unit id from a source path (the file stem).
    pub fn id_for_path(path: &Path) -> Option<String> {
        path.file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .filter(|stem| !stem.is_empty())
    }

    /// Get the unit id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the unit kind.
    pub fn kind(&self) -> UnitKind {
        self.kind
    }

    /// Get the path of the unit's source file.
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// Check if this unit lives in the tests tree.
    pub fn is_test(&self) -> bool {
        self.kind == UnitKind::Test
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.id, self.kind)
    }
}
