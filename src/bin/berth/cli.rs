//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell as CompletionShell;

/// berth - dependency graphs and deployment ordering for contract sources
#[derive(Parser)]
#[command(name = "berth")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Project directory (defaults to the nearest directory with a Berth.toml)
    #[arg(short = 'C', long = "manifest-path", global = true, value_name = "DIR")]
    pub manifest_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the dependency graph and write it out
    Graph(GraphArgs),

    /// List dependency cycles
    Cycles,

    /// Check interface conformance, duplicates and manifest coverage
    Check(CheckArgs),

    /// Print the deployment order
    Order(OrderArgs),

    /// Reorder deployment manifests to follow the deployment order
    Align(AlignArgs),

    /// Remove redundant depends_on items from deployment manifests
    Prune(PruneArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GraphFormat {
    Json,
    Dot,
    Markdown,
}

impl GraphFormat {
    pub fn file_name(&self) -> &'static str {
        match self {
            GraphFormat::Json => "system-graph.json",
            GraphFormat::Dot => "system-graph.dot",
            GraphFormat::Markdown => "system-graph.md",
        }
    }
}

#[derive(Args)]
pub struct GraphArgs {
    /// Output directory (defaults to the configured output dir)
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Formats to emit (defaults to json and dot)
    #[arg(long, value_enum)]
    pub format: Vec<GraphFormat>,

    /// Print to stdout instead of writing files
    #[arg(long)]
    pub stdout: bool,
}

#[derive(Args)]
pub struct CheckArgs {
    /// Report errors without failing
    #[arg(long)]
    pub warn_only: bool,
}

#[derive(Args)]
pub struct OrderArgs {
    /// Print the order as a JSON array
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct AlignArgs {
    /// Show what would change without writing
    #[arg(long)]
    pub dry_run: bool,

    /// Manifests to align (defaults to the configured manifests)
    pub manifests: Vec<PathBuf>,
}

#[derive(Args)]
pub struct PruneArgs {
    /// Show what would be removed without writing
    #[arg(long)]
    pub dry_run: bool,

    /// Manifests to prune (defaults to the configured manifests)
    pub manifests: Vec<PathBuf>,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: CompletionShell,
}
