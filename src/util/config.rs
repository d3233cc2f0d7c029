//! Project configuration (`Berth.toml`).
//!
//! The file is optional; every setting has a default matching the usual
//! Clarinet project layout:
//!
//! ```toml
//! [sources]
//! contracts = "contracts"
//! tests = "tests"
//! extensions = ["clar"]
//! registry = "contracts/traits/all-traits.clar"
//!
//! [manifests]
//! paths = ["Clarinet.toml", "stacks/Clarinet.test.toml"]
//! active-section = "contracts"
//! disabled-section = "disabled"
//!
//! [output]
//! dir = "artifacts"
//!
//! [check]
//! dynamic-calls = "warn"
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::manifest::ManifestSections;

/// Name of the project configuration file.
pub const CONFIG_NAME: &str = "Berth.toml";

/// Berth configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Source tree layout
    pub sources: SourcesConfig,

    /// Deployment manifests
    pub manifests: ManifestsConfig,

    /// Artifact output
    pub output: OutputConfig,

    /// Checks and lint policy
    pub check: CheckConfig,
}

/// Where unit sources live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SourcesConfig {
    /// Contracts tree, relative to the project root
    pub contracts: PathBuf,

    /// Tests tree, relative to the project root
    pub tests: PathBuf,

    /// Recognized source file extensions (without the dot)
    pub extensions: Vec<String>,

    /// The interface registry file
    pub registry: PathBuf,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        SourcesConfig {
            contracts: PathBuf::from("contracts"),
            tests: PathBuf::from("tests"),
            extensions: vec!["clar".to_string()],
            registry: PathBuf::from("contracts/traits/all-traits.clar"),
        }
    }
}

/// Which manifests to read and align.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ManifestsConfig {
    /// Manifest paths or glob patterns, relative to the project root
    pub paths: Vec<String>,

    #[serde(flatten)]
    pub sections: ManifestSections,
}

impl Default for ManifestsConfig {
    fn default() -> Self {
        ManifestsConfig {
            paths: vec![
                "Clarinet.toml".to_string(),
                "stacks/Clarinet.test.toml".to_string(),
            ],
            sections: ManifestSections::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory for graph artifacts, relative to the project root
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            dir: PathBuf::from("artifacts"),
        }
    }
}

/// How to treat a lint finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LintLevel {
    Allow,
    #[default]
    Warn,
    Deny,
}

impl FromStr for LintLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "allow" => Ok(LintLevel::Allow),
            "warn" => Ok(LintLevel::Warn),
            "deny" => Ok(LintLevel::Deny),
            _ => Err(format!(
                "invalid lint level '{}'; expected 'allow', 'warn', or 'deny'",
                s
            )),
        }
    }
}

impl fmt::Display for LintLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LintLevel::Allow => write!(f, "allow"),
            LintLevel::Warn => write!(f, "warn"),
            LintLevel::Deny => write!(f, "deny"),
        }
    }
}

/// Conformance and lint settings for `berth check`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CheckConfig {
    /// Policy for dynamic invocation targets in non-test units
    pub dynamic_calls: LintLevel,

    /// Conformance claims must go through a use-trait alias
    pub require_aliases: bool,

    /// use-trait aliases must point at the interface registry
    pub require_registry: bool,

    /// Check that implementers define every interface function
    pub functions: bool,

    /// Report units that no manifest lists
    pub manifest_coverage: bool,
}

impl Default for CheckConfig {
    fn default() -> Self {
        CheckConfig {
            dynamic_calls: LintLevel::Warn,
            require_aliases: false,
            require_registry: false,
            functions: true,
            manifest_coverage: true,
        }
    }
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;

        Self::parse(&contents).with_context(|| format!("failed to parse config: {}", path.display()))
    }

    /// Parse configuration from TOML text.
    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Load configuration, falling back to defaults if the file doesn't exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!("no config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }
}
