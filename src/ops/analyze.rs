//! The analysis pipeline: index the source tree, then build the graph.

use anyhow::Result;

use crate::graph::{build_graph, Graph};
use crate::ops::conformance::check_conformance;
use crate::ops::coverage::manifest_coverage;
use crate::ops::issue::Issue;
use crate::ops::order::configured_manifests;
use crate::source::{IndexOptions, SourceIndex};
use crate::util::GlobalContext;

/// The indexed sources of a project and their dependency graph.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub index: SourceIndex,
    pub graph: Graph,
}

impl Analysis {
    /// Problems found while indexing.
    pub fn index_issues(&self) -> Vec<Issue> {
        self.index.issues().iter().map(Issue::from).collect()
    }
}

/// Index the project and build its graph.
pub fn analyze(ctx: &GlobalContext) -> Analysis {
    let opts = IndexOptions::from_context(ctx);
    tracing::debug!(
        "indexing {} and {}",
        opts.contracts_dir.display(),
        opts.tests_dir.display()
    );

    let index = SourceIndex::build(&opts);
    let graph = build_graph(&index, Some(ctx.root()));

    let stats = graph.stats();
    tracing::info!(
        "indexed {} units: {} nodes, {} edges, {} cycles",
        index.len(),
        stats.node_count,
        stats.edge_count,
        graph.cycles().len()
    );

    Analysis { index, graph }
}

/// Options for `berth check`.
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// Report errors without failing
    pub warn_only: bool,
}

/// Everything `berth check` found.
#[derive(Debug, Clone, Default)]
pub struct CheckReport {
    pub issues: Vec<Issue>,
}

impl CheckReport {
    pub fn errors(&self) -> usize {
        self.issues.iter().filter(|i| i.is_error()).count()
    }

    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(Issue::is_error)
    }

    /// Whether the run should exit non-zero.
    pub fn fails(&self, opts: &CheckOptions) -> bool {
        self.has_errors() && !opts.warn_only
    }
}

/// Run index, conformance and coverage checks.
pub fn check(ctx: &GlobalContext, analysis: &Analysis) -> Result<CheckReport> {
    let config = &ctx.config().check;

    let mut issues = analysis.index_issues();
    issues.extend(check_conformance(&analysis.index, config));

    if config.manifest_coverage {
        let loaded = configured_manifests(ctx)?;
        if loaded.is_empty() {
            tracing::debug!("no manifests loaded; skipping coverage");
        } else {
            issues.extend(manifest_coverage(&analysis.index, &loaded));
        }
    }

    Ok(CheckReport { issues })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::issue::Finding;
    use crate::test_support::ProjectFixture;

    #[test]
    fn test_analyze_fixture() {
        let project = ProjectFixture::new()
            .contract("a", "")
            .contract("b", "(contract-call? .a f)")
            .test("b_test", "(contract-call? .b f)");
        let ctx = project.context();

        let analysis = analyze(&ctx);
        assert_eq!(analysis.index.len(), 3);
        assert_eq!(analysis.graph.edges().len(), 2);
        assert_eq!(
            analysis.graph.node("b").unwrap().path.as_deref(),
            Some("contracts/b.clar")
        );
    }

    #[test]
    fn test_check_collects_all_sources_of_issues() {
        let project = ProjectFixture::new()
            .registry("(define-trait t ((f () (response bool uint))))")
            .contract("x", "(impl-trait .all-traits.missing)")
            .contract_at("zz/x", "")
            .manifest(
                "Clarinet.toml",
                "[contracts.x]\npath = \"contracts/x.clar\"\n[contracts.gone]\npath = \"contracts/gone.clar\"\n",
            );
        let ctx = project.context();
        let analysis = analyze(&ctx);
        let report = check(&ctx, &analysis).unwrap();

        let findings: Vec<_> = report.issues.iter().map(|i| &i.finding).collect();
        assert!(findings
            .iter()
            .any(|f| matches!(f, Finding::DuplicateUnit { id, .. } if id == "x")));
        assert!(findings
            .iter()
            .any(|f| matches!(f, Finding::UnresolvedInterface { interface, .. } if interface == "missing")));
        assert!(findings
            .iter()
            .any(|f| matches!(f, Finding::UnlistedUnit { unit } if unit == "all-traits")));
        assert!(findings
            .iter()
            .any(|f| matches!(f, Finding::MissingSource { entry, .. } if entry == "gone")));
        assert!(report.has_errors());
        assert!(report.fails(&CheckOptions::default()));
        assert!(!report.fails(&CheckOptions { warn_only: true }));
    }
}
