//! `berth cycles` command

use anyhow::Result;

use crate::commands::Session;
use berth::graph::format_cycle;
use berth::util::shell::Status;

pub fn execute(session: &Session) -> Result<()> {
    let analysis = session.analyze();
    let cycles = analysis.graph.cycles();

    if cycles.is_empty() {
        session.shell.status(Status::Finished, "no dependency cycles");
        return Ok(());
    }

    for cycle in cycles {
        println!("{}", format_cycle(cycle));
    }
    session
        .shell
        .error(format!("{} dependency cycle(s) found", cycles.len()));
    std::process::exit(1);
}
