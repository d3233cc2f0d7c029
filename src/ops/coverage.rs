//! Manifest coverage: units on disk against manifest listings.

use std::collections::HashSet;

use crate::core::manifest::DeploymentManifest;
use crate::ops::issue::{Finding, Issue};
use crate::source::SourceIndex;

/// Report non-test units no manifest lists, and manifest entries whose
/// `path` does not exist. Entry paths are relative to the manifest.
pub fn manifest_coverage(index: &SourceIndex, manifests: &[DeploymentManifest]) -> Vec<Issue> {
    let listed: HashSet<&str> = manifests
        .iter()
        .flat_map(|m| m.entries())
        .map(|e| e.name.as_str())
        .collect();

    let mut issues = Vec::new();
    for source in index.units() {
        if source.unit.is_test() || listed.contains(source.id()) {
            continue;
        }
        issues.push(
            Issue::warning(Finding::UnlistedUnit {
                unit: source.id().to_string(),
            })
            .at(source.unit.source_path(), None),
        );
    }

    for manifest in manifests {
        let base = manifest.path().parent().unwrap_or(manifest.path());
        for entry in manifest.entries() {
            let Some(path) = &entry.path else {
                continue;
            };
            if !base.join(path).exists() {
                issues.push(
                    Issue::warning(Finding::MissingSource {
                        entry: entry.name.clone(),
                        path: path.clone(),
                    })
                    .at(manifest.path(), None),
                );
            }
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::analyze::analyze;
    use crate::test_support::ProjectFixture;

    #[test]
    fn test_coverage() {
        let project = ProjectFixture::new()
            .contract("listed", "")
            .contract("orphan", "")
            .test("listed_test", "")
            .manifest(
                "stacks/Clarinet.test.toml",
                r#"[contracts.listed]
path = "../contracts/listed.clar"

[disabled.ghost]
path = "../contracts/ghost.clar"
"#,
            );
        let ctx = project.context();
        let analysis = analyze(&ctx);
        let manifest = DeploymentManifest::load(
            &project.path("stacks/Clarinet.test.toml"),
            &ctx.config().manifests.sections,
        )
        .unwrap();

        let findings: Vec<_> = manifest_coverage(&analysis.index, &[manifest])
            .into_iter()
            .map(|i| i.finding)
            .collect();
        assert_eq!(
            findings,
            vec![
                Finding::UnlistedUnit {
                    unit: "orphan".into()
                },
                Finding::MissingSource {
                    entry: "ghost".into(),
                    path: "../contracts/ghost.clar".into()
                },
            ]
        );
    }
}
