//! The system dependency graph.
//!
//! Nodes are units, interfaces, and placeholders for references that could
//! not be tied to a unit in the tree. Only unit nodes take part in ordering
//! and cycle detection.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::core::unit::UnitKind;
use crate::graph::cycles::{find_cycles, Adjacency, Cycle};

/// Prefix of interface node ids.
pub const TRAIT_PREFIX: &str = "trait:";
/// Prefix of placeholder ids for references outside the tree.
pub const EXTERNAL_PREFIX: &str = "external-ref:";
/// Prefix of placeholder ids for non-literal invocation targets.
pub const DYNAMIC_PREFIX: &str = "dynamic:";

/// Node id for an interface.
pub fn trait_id(name: &str) -> String {
    format!("{}{}", TRAIT_PREFIX, name)
}

/// Node id for an unresolved reference.
pub fn external_id(text: &str) -> String {
    format!("{}{}", EXTERNAL_PREFIX, text)
}

/// Node id for a dynamic invocation target.
pub fn dynamic_id(text: &str) -> String {
    format!("{}{}", DYNAMIC_PREFIX, text)
}

/// What a node stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    Contract,
    Test,
    /// The interface registry unit
    Registry,
    /// An interface
    Trait,
    /// Placeholder for a reference outside the tree
    ExternalRef,
    /// Placeholder for a dynamic target
    Dynamic,
}

impl NodeKind {
    pub fn for_unit(kind: UnitKind) -> Self {
        match kind {
            UnitKind::Contract => NodeKind::Contract,
            UnitKind::Test => NodeKind::Test,
            UnitKind::Interface => NodeKind::Registry,
        }
    }

    /// Whether the node is a deployable unit.
    pub fn is_unit(&self) -> bool {
        matches!(self, NodeKind::Contract | NodeKind::Test | NodeKind::Registry)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Contract => "contract",
            NodeKind::Test => "test",
            NodeKind::Registry => "registry",
            NodeKind::Trait => "trait",
            NodeKind::ExternalRef => "external-ref",
            NodeKind::Dynamic => "dynamic",
        }
    }
}

/// Node attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeMeta {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub name: String,
    /// Source path relative to the project root (units only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Registry unit declaring this interface (interfaces only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defined_in: Option<String>,
}

/// Kind of dependency an edge records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeKind {
    Use,
    Implements,
    Calls,
    DynamicCall,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Use => "use",
            EdgeKind::Implements => "implements",
            EdgeKind::Calls => "calls",
            EdgeKind::DynamicCall => "dynamic-call",
        }
    }
}

/// A directed edge from a unit to a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
    #[serde(rename = "type")]
    pub kind: EdgeKind,
    /// True only for calls whose target is a unit in the tree
    pub resolved: bool,
    /// Line of the declaration in the source unit
    pub line: usize,
}

/// Summary counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub interface_count: usize,
}

/// The dependency graph of a project.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Graph {
    pub(crate) nodes: BTreeMap<String, NodeMeta>,
    pub(crate) edges: Vec<Edge>,
    pub(crate) cycles: Vec<Cycle>,
}

#[derive(Serialize)]
struct GraphDocument<'a> {
    nodes: Vec<&'a NodeMeta>,
    edges: &'a [Edge],
    stats: GraphStats,
    cycles: &'a [Cycle],
}

impl Graph {
    /// All nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeMeta> {
        self.nodes.values()
    }

    /// Look up a node.
    pub fn node(&self, id: &str) -> Option<&NodeMeta> {
        self.nodes.get(id)
    }

    /// Edges ordered by source unit, then appearance.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Edges leaving a unit.
    pub fn edges_from<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.from == id)
    }

    /// Cycles among resolved calls, found when the graph was built.
    pub fn cycles(&self) -> &[Cycle] {
        &self.cycles
    }

    /// Ids of unit nodes, sorted.
    pub fn unit_ids(&self) -> impl Iterator<Item = &str> {
        self.nodes
            .values()
            .filter(|n| n.kind.is_unit())
            .map(|n| n.id.as_str())
    }

    pub fn stats(&self) -> GraphStats {
        GraphStats {
            node_count: self.nodes.len(),
            edge_count: self.edges.len(),
            interface_count: self
                .nodes
                .values()
                .filter(|n| n.kind == NodeKind::Trait)
                .count(),
        }
    }

    /// Resolved calls between units. Every unit is a key.
    pub fn call_adjacency(&self) -> Adjacency {
        let mut adj: Adjacency = self.unit_ids().map(|id| (id.to_string(), Vec::new())).collect();
        for edge in &self.edges {
            if edge.kind == EdgeKind::Calls && edge.resolved {
                push_unique(adj.entry(edge.from.clone()).or_default(), &edge.to);
            }
        }
        adj
    }

    /// Cycles among resolved calls.
    pub fn call_cycles(&self) -> Vec<Cycle> {
        find_cycles(&self.call_adjacency())
    }

    /// Deployment dependencies between units.
    ///
    /// A unit depends on every unit it calls, and on the registry unit when
    /// it uses or implements an interface the registry declares.
    pub fn dependencies(&self) -> Adjacency {
        let mut adj = self.call_adjacency();
        for edge in &self.edges {
            if !matches!(edge.kind, EdgeKind::Use | EdgeKind::Implements) {
                continue;
            }
            let Some(registry) = self.nodes.get(&edge.to).and_then(|n| n.defined_in.as_ref()) else {
                continue;
            };
            if *registry != edge.from {
                push_unique(adj.entry(edge.from.clone()).or_default(), registry);
            }
        }
        adj
    }

    /// Pretty-printed JSON document: `{nodes, edges, stats, cycles}`.
    pub fn to_json(&self) -> serde_json::Result<String> {
        let doc = GraphDocument {
            nodes: self.nodes.values().collect(),
            edges: &self.edges,
            stats: self.stats(),
            cycles: &self.cycles,
        };
        serde_json::to_string_pretty(&doc)
    }
}

fn push_unique(list: &mut Vec<String>, item: &str) {
    if !list.iter().any(|x| x == item) {
        list.push(item.to_string());
    }
}
