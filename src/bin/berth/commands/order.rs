//! `berth order` command

use anyhow::{Context, Result};

use crate::cli::OrderArgs;
use crate::commands::Session;
use berth::util::shell::Status;

pub fn execute(args: OrderArgs, session: &Session) -> Result<()> {
    let analysis = session.analyze();
    let paths = session.manifest_paths(&[])?;

    session.shell.status(Status::Sorting, "deployment order");
    let Some(order) = session.deployment_order(&analysis, &paths) else {
        std::process::exit(1);
    };

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&order).context("failed to serialize order")?
        );
    } else {
        for name in &order {
            println!("{}", name);
        }
    }
    Ok(())
}
