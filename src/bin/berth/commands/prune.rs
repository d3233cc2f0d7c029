//! `berth prune` command

use anyhow::Result;

use crate::cli::PruneArgs;
use crate::commands::Session;
use berth::ops::{prune_manifests, PruneOptions, PruneOutcome};
use berth::util::shell::Status;

pub fn execute(args: PruneArgs, session: &Session) -> Result<()> {
    let opts = PruneOptions {
        dry_run: args.dry_run,
    };

    let paths = session.manifest_paths(&args.manifests)?;
    let sections = &session.ctx.config().manifests.sections;
    let outcomes = prune_manifests(&paths, sections, &opts);

    for outcome in &outcomes {
        match outcome {
            PruneOutcome::Pruned {
                removed, written, ..
            } => {
                let status = if *written { Status::Pruned } else { Status::Info };
                session.shell.status(status, outcome);
                for removal in removed {
                    session.shell.note(format!("removed {}", removal));
                }
            }
            PruneOutcome::Unchanged { .. } => session.shell.status(Status::Unchanged, outcome),
            PruneOutcome::Skipped { .. } => session.shell.status(Status::Skipped, outcome),
            PruneOutcome::Failed { .. } => session.shell.error(outcome),
        }
    }

    if outcomes.iter().any(PruneOutcome::is_failure) {
        std::process::exit(1);
    }
    Ok(())
}
