//! Test fixtures for common test scenarios.
//!
//! [`ProjectFixture`] writes a project tree into a temporary directory as it
//! is built, so each builder call is immediately visible on disk.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::util::config::CONFIG_NAME;
use crate::util::GlobalContext;

/// A project on disk in a temporary directory.
#[derive(Debug)]
pub struct ProjectFixture {
    dir: TempDir,
}

impl ProjectFixture {
    /// Create an empty project.
    pub fn new() -> Self {
        ProjectFixture {
            dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    /// Project root.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Absolute path of a project-relative file.
    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    /// Write a file, creating parent directories.
    pub fn file(self, rel: &str, contents: &str) -> Self {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("failed to create fixture dir");
        }
        std::fs::write(&path, contents).expect("failed to write fixture file");
        self
    }

    /// Add `contracts/<name>.clar`.
    pub fn contract(self, name: &str, source: &str) -> Self {
        self.contract_at(name, source)
    }

    /// Add a contract at `contracts/<rel>.clar` (rel may contain directories).
    pub fn contract_at(self, rel: &str, source: &str) -> Self {
        let rel = format!("contracts/{}.clar", rel);
        self.file(&rel, source)
    }

    /// Add `tests/<name>.clar`.
    pub fn test(self, name: &str, source: &str) -> Self {
        let rel = format!("tests/{}.clar", name);
        self.file(&rel, source)
    }

    /// Write the interface registry at its default location.
    pub fn registry(self, source: &str) -> Self {
        self.file("contracts/traits/all-traits.clar", source)
    }

    /// Write a manifest.
    pub fn manifest(self, rel: &str, contents: &str) -> Self {
        self.file(rel, contents)
    }

    /// Write `Berth.toml`.
    pub fn config(self, contents: &str) -> Self {
        self.file(CONFIG_NAME, contents)
    }

    /// Read a project file.
    pub fn read(&self, rel: &str) -> String {
        std::fs::read_to_string(self.path(rel)).expect("failed to read fixture file")
    }

    /// A context rooted at the project.
    pub fn context(&self) -> GlobalContext {
        GlobalContext::with_cwd(self.root().to_path_buf()).expect("failed to create context")
    }
}

impl Default for ProjectFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Sample unit sources.
pub mod sources {
    /// A registry declaring a fungible-token interface.
    pub fn registry() -> &'static str {
        r#";; Canonical interfaces
(define-trait sip-010-trait
  (
    (transfer (uint principal principal (optional (buff 34))) (response bool uint))
    (get-balance (principal) (response uint uint))
  )
)
"#
    }

    /// A token conforming to the registry's interface through an alias.
    pub fn token() -> &'static str {
        r#"(use-trait ft .all-traits.sip-010-trait)
(impl-trait ft)

(define-public (transfer (amount uint) (sender principal) (recipient principal) (memo (optional (buff 34))))
  (ok true))

(define-read-only (get-balance (who principal))
  (ok u0))
"#
    }

    /// A unit calling `callee` once.
    pub fn caller(callee: &str) -> String {
        format!(
            "(define-public (run)\n  (contract-call? .{} transfer u1 tx-sender tx-sender none))\n",
            callee
        )
    }
}
