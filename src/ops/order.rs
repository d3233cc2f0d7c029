//! Implementation of `berth order`: the deployment order of a project.

use std::path::PathBuf;

use anyhow::Result;

use crate::core::manifest::{DeploymentManifest, ManifestError, ManifestSections};
use crate::graph::{Adjacency, Graph};
use crate::order::{CycleError, DeploymentOrder, TopologicalSorter};
use crate::util::GlobalContext;

/// Load each manifest, keeping per-path failures.
pub fn load_manifests(
    paths: &[PathBuf],
    sections: &ManifestSections,
) -> Vec<(PathBuf, Result<DeploymentManifest, ManifestError>)> {
    paths
        .iter()
        .map(|path| {
            let result = DeploymentManifest::load(path, sections);
            match &result {
                Ok(m) => tracing::debug!("loaded {} ({} entries)", path.display(), m.entries().len()),
                Err(ManifestError::NotFound { .. }) => {
                    tracing::info!("manifest not found: {}", path.display())
                }
                Err(e) => tracing::warn!("{}", e),
            }
            (path.clone(), result)
        })
        .collect()
}

/// Graph-derived dependencies plus every manifest's `depends_on`.
///
/// Manifest names unknown to the graph join as dependency-free nodes.
pub fn combined_dependencies(graph: &Graph, manifests: &[DeploymentManifest]) -> Adjacency {
    let mut deps = graph.dependencies();
    for manifest in manifests {
        for entry in manifest.entries() {
            deps.entry(entry.name.clone()).or_default();
            for dependency in &entry.depends_on {
                deps.entry(dependency.clone()).or_default();
                let list = deps.entry(entry.name.clone()).or_default();
                if !list.contains(dependency) {
                    list.push(dependency.clone());
                }
            }
        }
    }
    deps
}

/// Sort the combined dependencies.
pub fn deployment_order(
    graph: &Graph,
    manifests: &[DeploymentManifest],
) -> Result<DeploymentOrder, CycleError> {
    let deps = combined_dependencies(graph, manifests);
    let mut sorter = TopologicalSorter::new();
    sorter.extend(&deps);
    let order = sorter.sort()?;
    tracing::debug!("deployment order has {} names", order.len());
    Ok(order)
}

/// Load the configured manifests that exist and parse.
pub fn configured_manifests(ctx: &GlobalContext) -> Result<Vec<DeploymentManifest>> {
    let sections = &ctx.config().manifests.sections;
    Ok(load_manifests(&ctx.manifest_paths()?, sections)
        .into_iter()
        .filter_map(|(_, result)| result.ok())
        .collect())
}
