//! berth CLI - dependency graphs and deployment ordering for contract sources

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};
use commands::Session;

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.quiet {
        EnvFilter::new("berth=warn")
    } else if cli.verbose {
        EnvFilter::new("berth=debug")
    } else {
        EnvFilter::new("berth=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    if let Commands::Completions(args) = cli.command {
        return commands::completions::execute(args);
    }

    let session = Session::new(&cli)?;

    // Execute command
    match cli.command {
        Commands::Graph(args) => commands::graph::execute(args, &session),
        Commands::Cycles => commands::cycles::execute(&session),
        Commands::Check(args) => commands::check::execute(args, &session),
        Commands::Order(args) => commands::order::execute(args, &session),
        Commands::Align(args) => commands::align::execute(args, &session),
        Commands::Prune(args) => commands::prune::execute(args, &session),
        Commands::Completions(_) => Ok(()),
    }
}
