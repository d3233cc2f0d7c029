//! `berth graph` command

use anyhow::{Context, Result};

use crate::cli::{GraphArgs, GraphFormat};
use crate::commands::Session;
use berth::graph::export::{to_dot, to_markdown};
use berth::graph::Graph;
use berth::util::fs::{ensure_dir, write_string};
use berth::util::shell::Status;

fn render(graph: &Graph, format: GraphFormat) -> Result<String> {
    Ok(match format {
        GraphFormat::Json => graph.to_json().context("failed to serialize graph")?,
        GraphFormat::Dot => to_dot(graph),
        GraphFormat::Markdown => to_markdown(graph),
    })
}

pub fn execute(args: GraphArgs, session: &Session) -> Result<()> {
    let analysis = session.analyze();
    let graph = &analysis.graph;

    let formats = if !args.format.is_empty() {
        args.format
    } else if args.stdout {
        vec![GraphFormat::Json]
    } else {
        vec![GraphFormat::Json, GraphFormat::Dot]
    };

    if args.stdout {
        for format in formats {
            println!("{}", render(graph, format)?);
        }
        return Ok(());
    }

    let out_dir = match &args.out {
        Some(dir) => session.ctx.resolve_path(dir),
        None => session.ctx.output_dir(),
    };
    ensure_dir(&out_dir)?;

    for format in formats {
        let path = out_dir.join(format.file_name());
        write_string(&path, &render(graph, format)?)?;
        session.shell.status(Status::Wrote, path.display());
    }

    let stats = graph.stats();
    session.shell.status(
        Status::Finished,
        format!(
            "{} nodes, {} edges, {} interfaces, {} cycles",
            stats.node_count,
            stats.edge_count,
            stats.interface_count,
            graph.cycles().len()
        ),
    );
    Ok(())
}
