//! Graph renderings besides JSON.

use std::collections::BTreeSet;
use std::fmt::Write;

use crate::graph::cycles::format_cycle;
use crate::graph::model::{EdgeKind, Graph, NodeKind};

fn edge_color(kind: EdgeKind) -> &'static str {
    match kind {
        EdgeKind::Use => "#8888ff",
        EdgeKind::Implements => "#3333ff",
        EdgeKind::Calls => "#44aa44",
        EdgeKind::DynamicCall => "#ffaa00",
    }
}

fn node_shape(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Contract | NodeKind::Registry => "box",
        NodeKind::Trait => "ellipse",
        NodeKind::Test => "note",
        NodeKind::ExternalRef | NodeKind::Dynamic => "plaintext",
    }
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Render the graph in Graphviz DOT format.
pub fn to_dot(graph: &Graph) -> String {
    let mut out = String::with_capacity(4096);
    let _ = writeln!(out, "digraph system {{");
    let _ = writeln!(out, "  rankdir=LR;");
    let _ = writeln!(out, "  node [fontname=\"monospace\", fontsize=10];");
    let _ = writeln!(out, "  edge [fontsize=8];");
    let _ = writeln!(out);

    for node in graph.nodes() {
        let _ = writeln!(
            out,
            "  \"{}\" [label=\"{}\\n({})\", shape={}];",
            escape(&node.id),
            escape(&node.name),
            node.kind.as_str(),
            node_shape(node.kind)
        );
    }

    let _ = writeln!(out);

    for edge in graph.edges() {
        let style = if edge.kind == EdgeKind::Calls && !edge.resolved {
            ", style=dashed"
        } else {
            ""
        };
        let _ = writeln!(
            out,
            "  \"{}\" -> \"{}\" [color=\"{}\", label=\"{}\"{}];",
            escape(&edge.from),
            escape(&edge.to),
            edge_color(edge.kind),
            edge.kind.as_str(),
            style
        );
    }

    let _ = writeln!(out, "}}");
    out
}

/// Render a Markdown listing of each unit's dependencies.
pub fn to_markdown(graph: &Graph) -> String {
    let mut out = String::new();
    let stats = graph.stats();
    let _ = writeln!(out, "# Dependency graph");
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{} nodes, {} edges, {} interfaces, {} cycles",
        stats.node_count,
        stats.edge_count,
        stats.interface_count,
        graph.cycles().len()
    );

    for id in graph.unit_ids() {
        let deps: BTreeSet<(&str, &str)> = graph
            .edges_from(id)
            .map(|e| (e.to.as_str(), e.kind.as_str()))
            .collect();

        let _ = writeln!(out);
        let _ = writeln!(out, "## {}", id);
        let _ = writeln!(out);
        if deps.is_empty() {
            let _ = writeln!(out, "_no dependencies_");
        }
        for (to, kind) in deps {
            let _ = writeln!(out, "- `{}` ({})", to, kind);
        }
    }

    if !graph.cycles().is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "## Cycles");
        let _ = writeln!(out);
        for cycle in graph.cycles() {
            let _ = writeln!(out, "- {}", format_cycle(cycle));
        }
    }

    out
}
