//! `berth align` command

use anyhow::Result;

use crate::cli::AlignArgs;
use crate::commands::Session;
use berth::ops::{align_manifests, AlignOptions, AlignOutcome};
use berth::util::shell::Status;

pub fn execute(args: AlignArgs, session: &Session) -> Result<()> {
    let opts = AlignOptions {
        dry_run: args.dry_run,
    };

    let analysis = session.analyze();
    let paths = session.manifest_paths(&args.manifests)?;

    session.shell.status(Status::Sorting, "deployment order");
    let Some(order) = session.deployment_order(&analysis, &paths) else {
        std::process::exit(1);
    };

    let sections = &session.ctx.config().manifests.sections;
    let outcomes = align_manifests(&paths, sections, &order, &opts);

    for outcome in &outcomes {
        match outcome {
            AlignOutcome::Aligned {
                written: false,
                order,
                ..
            } => {
                session
                    .shell
                    .status(Status::Info, format!("{} (dry run)", outcome));
                if session.shell.is_verbose() {
                    for name in order {
                        eprintln!("{:>12} {}", "", name);
                    }
                }
            }
            AlignOutcome::Aligned { .. } => session.shell.status(Status::Aligned, outcome),
            AlignOutcome::Unchanged { .. } => session.shell.status(Status::Unchanged, outcome),
            AlignOutcome::Skipped { .. } => session.shell.status(Status::Skipped, outcome),
            AlignOutcome::Failed { .. } => session.shell.error(outcome),
        }
    }

    if outcomes.iter().any(AlignOutcome::is_failure) {
        std::process::exit(1);
    }
    Ok(())
}
