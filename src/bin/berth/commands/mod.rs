//! Command implementations

pub mod align;
pub mod check;
pub mod completions;
pub mod cycles;
pub mod graph;
pub mod order;
pub mod prune;

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::cli::Cli;
use berth::ops::{analyze, deployment_order, load_manifests, Analysis};
use berth::order::DeploymentOrder;
use berth::util::diagnostic::suggestions;
use berth::util::shell::{ColorChoice, Status};
use berth::util::{GlobalContext, Shell};

/// State shared by every command of one invocation.
pub struct Session {
    pub ctx: GlobalContext,
    pub shell: Shell,
}

impl Session {
    pub fn new(cli: &Cli) -> Result<Self> {
        let color = if cli.no_color {
            ColorChoice::Never
        } else {
            ColorChoice::Auto
        };
        let shell = Shell::from_flags(cli.quiet, cli.verbose, color);

        let ctx = match &cli.manifest_path {
            Some(dir) => {
                let cwd = std::env::current_dir().context("failed to get current directory")?;
                GlobalContext::with_cwd(cwd.join(dir))?
            }
            None => GlobalContext::new()?,
        };

        match ctx.config_path() {
            Some(path) => tracing::debug!("using config {}", path.display()),
            None if shell.is_verbose() => shell.note(suggestions::NO_CONFIG),
            None => {}
        }

        Ok(Session { ctx, shell })
    }

    /// Index the project with a spinner running.
    pub fn analyze(&self) -> Analysis {
        let progress = self.shell.spinner(format!("Indexing {}", self.ctx.root().display()));
        let analysis = analyze(&self.ctx);
        progress.finish();

        self.shell.status(
            Status::Indexing,
            format!(
                "{} units, {} edges",
                analysis.index.len(),
                analysis.graph.edges().len()
            ),
        );
        for issue in analysis.index_issues() {
            self.shell.diagnostic(&issue.to_diagnostic());
        }
        analysis
    }

    /// Manifests named on the command line, or the configured ones.
    pub fn manifest_paths(&self, explicit: &[PathBuf]) -> Result<Vec<PathBuf>> {
        if explicit.is_empty() {
            self.ctx.manifest_paths()
        } else {
            Ok(explicit.iter().map(|p| self.ctx.resolve_path(p)).collect())
        }
    }

    /// The deployment order over the graph and the given manifests.
    ///
    /// On a cycle the diagnostic is printed and `None` returned.
    pub fn deployment_order(
        &self,
        analysis: &Analysis,
        paths: &[PathBuf],
    ) -> Option<DeploymentOrder> {
        let sections = &self.ctx.config().manifests.sections;
        let manifests: Vec<_> = load_manifests(paths, sections)
            .into_iter()
            .filter_map(|(_, loaded)| loaded.ok())
            .collect();

        match deployment_order(&analysis.graph, &manifests) {
            Ok(order) => Some(order),
            Err(e) => {
                self.shell.diagnostic(&e.to_diagnostic());
                None
            }
        }
    }
}
