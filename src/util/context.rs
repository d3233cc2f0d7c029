//! Global context for berth operations.
//!
//! Provides centralized access to the project root, configuration, and the
//! paths derived from it.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::util::config::{Config, CONFIG_NAME};
use crate::util::fs::{glob_files, is_glob};

/// Global context for a single invocation.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// Project root (directory holding Berth.toml, or the cwd)
    root: PathBuf,

    /// Path of the loaded config file, if any
    config_path: Option<PathBuf>,

    /// Effective configuration
    config: Config,
}

impl GlobalContext {
    /// Create a context rooted at the current directory.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Self::with_cwd(cwd)
    }

    /// Create a context for a specific working directory.
    ///
    /// The project root is the nearest ancestor containing `Berth.toml`;
    /// without one, the working directory itself is the root.
    pub fn with_cwd(cwd: PathBuf) -> Result<Self> {
        let config_path = find_config(&cwd);
        let root = config_path
            .as_ref()
            .and_then(|p| p.parent())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| cwd.clone());

        let config = match &config_path {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };

        Ok(GlobalContext {
            cwd,
            root,
            config_path,
            config,
        })
    }

    /// Create a context with an explicit root and configuration.
    pub fn with_config(root: PathBuf, config: Config) -> Self {
        GlobalContext {
            cwd: root.clone(),
            root,
            config_path: None,
            config,
        }
    }

    /// Get the current working directory.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Get the project root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the loaded config file path.
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Get the effective configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Absolute contracts directory.
    pub fn contracts_dir(&self) -> PathBuf {
        self.root.join(&self.config.sources.contracts)
    }

    /// Absolute tests directory.
    pub fn tests_dir(&self) -> PathBuf {
        self.root.join(&self.config.sources.tests)
    }

    /// Absolute path of the interface registry file.
    pub fn registry_path(&self) -> PathBuf {
        self.root.join(&self.config.sources.registry)
    }

    /// Absolute artifact output directory.
    pub fn output_dir(&self) -> PathBuf {
        self.root.join(&self.config.output.dir)
    }

    /// Resolve a user-supplied path against the working directory.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }

    /// The configured manifest paths.
    ///
    /// Plain paths are returned whether or not they exist (a missing manifest
    /// is skipped later, with a message); glob patterns expand to the files
    /// they match.
    pub fn manifest_paths(&self) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for pattern in &self.config.manifests.paths {
            if is_glob(pattern) {
                paths.extend(glob_files(&self.root, std::slice::from_ref(pattern))?);
            } else {
                paths.push(self.root.join(pattern));
            }
        }
        let mut seen = std::collections::HashSet::new();
        paths.retain(|p| seen.insert(p.clone()));
        Ok(paths)
    }
}

/// Search upward from `start` for a `Berth.toml`.
pub fn find_config(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        let candidate = current.join(CONFIG_NAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        if !current.pop() {
            return None;
        }
    }
}
