//! `berth check` command

use anyhow::Result;

use crate::cli::CheckArgs;
use crate::commands::Session;
use berth::ops::{check, tally, CheckOptions};
use berth::util::shell::Status;

pub fn execute(args: CheckArgs, session: &Session) -> Result<()> {
    let opts = CheckOptions {
        warn_only: args.warn_only,
    };

    let analysis = session.analyze();
    session.shell.status(Status::Analyzing, "interfaces and manifests");
    let report = check(&session.ctx, &analysis)?;

    // Index issues were already shown while indexing.
    let shown = analysis.index.issues().len();
    for issue in report.issues.iter().skip(shown) {
        session.shell.diagnostic(&issue.to_diagnostic());
    }

    let (errors, warnings) = tally(&report.issues);
    let summary = format!("{} error(s), {} warning(s)", errors, warnings);
    if report.fails(&opts) {
        session.shell.error(summary);
        std::process::exit(1);
    }

    session.shell.status(Status::Finished, summary);
    Ok(())
}
