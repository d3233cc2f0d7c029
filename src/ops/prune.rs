//! Implementation of `berth prune`.
//!
//! Drops `depends_on` items a manifest already implies: duplicates, and
//! dependencies reachable through another direct dependency of the same
//! entry. The manifest's transitive dependency closure is unchanged, so the
//! deployment order is too.

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

use crate::core::manifest::{DeploymentManifest, ManifestError, ManifestSections};
use crate::graph::Adjacency;
use crate::ops::order::load_manifests;
use crate::order::prune::essential_dependencies;
use crate::util::fs::write_atomic;

/// Options for prune command.
#[derive(Debug, Clone, Default)]
pub struct PruneOptions {
    /// Report removals without writing
    pub dry_run: bool,
}

/// A `depends_on` item removed from an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Removal {
    pub entry: String,
    pub dependency: String,
}

impl fmt::Display for Removal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.entry, self.dependency)
    }
}

/// What happened to one manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PruneOutcome {
    Pruned {
        path: PathBuf,
        removed: Vec<Removal>,
        written: bool,
    },
    Unchanged { path: PathBuf },
    Skipped { path: PathBuf },
    Failed { path: PathBuf, error: String },
}

impl PruneOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, PruneOutcome::Failed { .. })
    }
}

impl fmt::Display for PruneOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PruneOutcome::Pruned { path, removed, .. } => {
                write!(f, "{} ({} removed)", path.display(), removed.len())
            }
            PruneOutcome::Unchanged { path } => write!(f, "{} (nothing to prune)", path.display()),
            PruneOutcome::Skipped { path } => write!(f, "{} (not found)", path.display()),
            PruneOutcome::Failed { path, error } => write!(f, "{}: {}", path.display(), error),
        }
    }
}

/// The dependencies a manifest declares, and nothing else.
fn declared_dependencies(manifest: &DeploymentManifest) -> Adjacency {
    let mut adj = Adjacency::new();
    for entry in manifest.entries() {
        adj.entry(entry.name.clone())
            .or_default()
            .extend(entry.depends_on.iter().cloned());
    }
    adj
}

/// Prune one manifest in place.
pub fn prune_manifest(manifest: &mut DeploymentManifest, opts: &PruneOptions) -> PruneOutcome {
    let path = manifest.path().to_path_buf();
    let adj = declared_dependencies(manifest);

    let plans: Vec<_> = manifest
        .entries()
        .iter()
        .map(|e| {
            let keep = essential_dependencies(&adj, &e.name);
            (e.name.clone(), e.partition(), e.depends_on.clone(), keep)
        })
        .filter(|(_, _, current, keep)| current.is_empty() || current != keep)
        .collect();

    let mut changed = false;

    let mut removed = Vec::new();
    for (name, partition, current, keep) in plans {
        let mut seen = HashSet::new();
        for dep in &current {
            if !keep.contains(dep) || !seen.insert(dep.as_str()) {
                removed.push(Removal {
                    entry: name.clone(),
                    dependency: dep.clone(),
                });
            }
        }

        if keep.is_empty() {
            // An empty `depends_on = []` says nothing; drop the key.
            changed |= manifest.remove_depends_on(partition, &name);
            continue;
        }
        if let Some(array) = manifest.depends_on_mut(partition, &name) {
            let mut retained = HashSet::new();
            array.retain(|value| match value.as_str() {
                Some(dep) => keep.iter().any(|k| k == dep) && retained.insert(dep.to_string()),
                None => true,
            });
            changed = true;
        }
        tracing::debug!("pruned depends_on of {} to {:?}", name, keep);
    }

    if !changed {
        return PruneOutcome::Unchanged { path };
    }
    manifest.refresh();

    if opts.dry_run {
        return PruneOutcome::Pruned {
            path,
            removed,
            written: false,
        };
    }

    match write_atomic(&path, &manifest.render()) {
        Ok(()) => {
            tracing::info!("pruned {}", path.display());
            PruneOutcome::Pruned {
                path,
                removed,
                written: true,
            }
        }
        Err(e) => PruneOutcome::Failed {
            path,
            error: format!("{:#}", e),
        },
    }
}

/// Prune each manifest in turn.
pub fn prune_manifests(
    paths: &[PathBuf],
    sections: &ManifestSections,
    opts: &PruneOptions,
) -> Vec<PruneOutcome> {
    load_manifests(paths, sections)
        .into_iter()
        .map(|(path, loaded)| match loaded {
            Ok(mut manifest) => prune_manifest(&mut manifest, opts),
            Err(ManifestError::NotFound { .. }) => PruneOutcome::Skipped { path },
            Err(e) => PruneOutcome::Failed {
                path,
                error: e.to_string(),
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;
    use crate::ops::order::deployment_order;
    use crate::test_support::ProjectFixture;

    const REDUNDANT: &str = r#"[contracts.M]
path = "M.clar"

[contracts.O]
path = "O.clar"
depends_on = ["M"]

[contracts.N]
path = "N.clar"
depends_on = ["O", "M", "O"]   # keep this comment

[contracts.P]
path = "P.clar"
depends_on = ["M", "M"]
"#;

    fn removals(outcome: &PruneOutcome) -> Vec<String> {
        match outcome {
            PruneOutcome::Pruned { removed, .. } => removed.iter().map(|r| r.to_string()).collect(),
            other => panic!("expected pruned outcome, got {:?}", other),
        }
    }

    #[test]
    fn test_prune_transitive_and_duplicates() {
        let project = ProjectFixture::new().manifest("Clarinet.toml", REDUNDANT);
        let outcomes = prune_manifests(
            &[project.path("Clarinet.toml")],
            &ManifestSections::default(),
            &PruneOptions::default(),
        );
        assert_eq!(removals(&outcomes[0]), vec!["N -> M", "N -> O", "P -> M"]);

        let pruned = project.read("Clarinet.toml");
        assert!(pruned.contains("depends_on = [\"O\"]   # keep this comment"));
        assert!(pruned.contains("depends_on = [\"M\"]\n\n[contracts.P]"));

        let manifest =
            DeploymentManifest::load(&project.path("Clarinet.toml"), &ManifestSections::default())
                .unwrap();
        assert_eq!(manifest.get("P").unwrap().depends_on, vec!["M"]);
    }

    #[test]
    fn test_prune_preserves_order() {
        let sections = ManifestSections::default();
        let before = DeploymentManifest::parse(REDUNDANT, "Clarinet.toml".as_ref(), &sections).unwrap();
        let mut after = before.clone();
        prune_manifest(&mut after, &PruneOptions { dry_run: true });

        let graph = Graph::default();
        assert_eq!(
            deployment_order(&graph, &[before]).unwrap(),
            deployment_order(&graph, &[after]).unwrap()
        );
    }

    #[test]
    fn test_prune_drops_emptied_key() {
        let mut manifest = DeploymentManifest::parse(
            "[contracts.A]\npath = \"A.clar\"\ndepends_on = []\n\n[contracts.B]\npath = \"B.clar\"\n",
            "Clarinet.toml".as_ref(),
            &ManifestSections::default(),
        )
        .unwrap();
        let outcome = prune_manifest(&mut manifest, &PruneOptions { dry_run: true });
        assert!(matches!(
            outcome,
            PruneOutcome::Pruned { ref removed, .. } if removed.is_empty()
        ));
        assert!(!manifest.render().contains("depends_on"));
    }

    #[test]
    fn test_mutual_dependencies_are_kept() {
        let mut manifest = DeploymentManifest::parse(
            "[contracts.A]\ndepends_on = [\"B\", \"C\"]\n[contracts.B]\ndepends_on = [\"C\"]\n[contracts.C]\ndepends_on = [\"B\"]\n",
            "Clarinet.toml".as_ref(),
            &ManifestSections::default(),
        )
        .unwrap();
        let outcome = prune_manifest(&mut manifest, &PruneOptions { dry_run: true });
        assert!(matches!(outcome, PruneOutcome::Unchanged { .. }));
    }

    #[test]
    fn test_dry_run_and_missing() {
        let project = ProjectFixture::new().manifest("Clarinet.toml", REDUNDANT);
        let outcomes = prune_manifests(
            &[project.path("Clarinet.toml"), project.path("missing.toml")],
            &ManifestSections::default(),
            &PruneOptions { dry_run: true },
        );
        assert!(matches!(&outcomes[0], PruneOutcome::Pruned { written: false, .. }));
        assert!(matches!(outcomes[1], PruneOutcome::Skipped { .. }));
        assert_eq!(project.read("Clarinet.toml"), REDUNDANT);
    }
}
