//! Graph construction from extracted declarations.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use crate::core::declaration::{DeclarationRecord, InterfaceRef, InvokeTarget};
use crate::core::interface::InterfaceRegistry;
use crate::graph::model::{
    dynamic_id, external_id, trait_id, Edge, EdgeKind, Graph, NodeKind, NodeMeta,
};
use crate::source::{SourceIndex, SourceUnit};
use crate::util::fs::{relative_path, to_slash};

/// Resolve an interface reference through a unit's aliases.
///
/// A bare name bound by `use-trait` resolves to the aliased reference;
/// anything else stands for itself.
pub fn resolve_interface(reference: &str, aliases: &HashMap<String, InterfaceRef>) -> InterfaceRef {
    match InterfaceRef::parse(reference) {
        InterfaceRef::Name(name) => aliases
            .get(&name)
            .cloned()
            .unwrap_or(InterfaceRef::Name(name)),
        other => other,
    }
}

/// Aliases bound by a unit's `use-trait` declarations. The first binding of
/// an alias wins.
pub fn unit_aliases(source: &SourceUnit) -> HashMap<String, InterfaceRef> {
    let mut aliases = HashMap::new();
    for decl in &source.declarations {
        if let DeclarationRecord::UseInterface {
            alias,
            interface_ref,
        } = &decl.record
        {
            aliases
                .entry(alias.clone())
                .or_insert_with(|| InterfaceRef::parse(interface_ref));
        }
    }
    aliases
}

/// Builds a [`Graph`] from indexed units.
#[derive(Debug)]
pub struct GraphBuilder<'a> {
    index: &'a SourceIndex,
    registry: &'a InterfaceRegistry,
    root: Option<PathBuf>,
    nodes: BTreeMap<String, NodeMeta>,
    edges: Vec<Edge>,
}

impl<'a> GraphBuilder<'a> {
    /// Create a builder. Local references resolve against the whole index,
    /// so units may be added in any order.
    pub fn new(index: &'a SourceIndex, registry: &'a InterfaceRegistry) -> Self {
        let mut builder = GraphBuilder {
            index,
            registry,
            root: None,
            nodes: BTreeMap::new(),
            edges: Vec::new(),
        };

        for def in registry.iter() {
            builder.interface_node(&def.name);
        }
        builder
    }

    /// Record unit paths relative to `root`.
    pub fn with_root(mut self, root: &Path) -> Self {
        self.root = Some(root.to_path_buf());
        self
    }

    fn unit_node(&mut self, source: &SourceUnit) {
        let path = match &self.root {
            Some(root) => relative_path(root, source.unit.source_path()),
            None => source.unit.source_path().to_path_buf(),
        };
        self.nodes.insert(
            source.id().to_string(),
            NodeMeta {
                id: source.id().to_string(),
                kind: NodeKind::for_unit(source.unit.kind()),
                name: source.id().to_string(),
                path: Some(to_slash(&path)),
                defined_in: None,
            },
        );
    }

    fn interface_node(&mut self, name: &str) -> String {
        let id = trait_id(name);
        let defined_in = if self.registry.contains(name) {
            self.registry.unit().map(str::to_string)
        } else {
            None
        };
        self.nodes.entry(id.clone()).or_insert_with(|| NodeMeta {
            id: id.clone(),
            kind: NodeKind::Trait,
            name: name.to_string(),
            path: None,
            defined_in,
        });
        id
    }

    fn placeholder(&mut self, id: String, kind: NodeKind, name: &str) -> String {
        self.nodes.entry(id.clone()).or_insert_with(|| NodeMeta {
            id: id.clone(),
            kind,
            name: name.to_string(),
            path: None,
            defined_in: None,
        });
        id
    }

    fn edge(&mut self, from: &str, to: String, kind: EdgeKind, resolved: bool, line: usize) {
        self.edges.push(Edge {
            from: from.to_string(),
            to,
            kind,
            resolved,
            line,
        });
    }

    /// Add a unit's node and the edges for its declarations.
    pub fn add_unit(&mut self, source: &SourceUnit) {
        self.unit_node(source);

        let from = source.id();
        let aliases = unit_aliases(source);

        for decl in &source.declarations {
            match &decl.record {
                DeclarationRecord::DeclareInterface(_) => {}
                DeclarationRecord::UseInterface { interface_ref, .. } => {
                    let target = InterfaceRef::parse(interface_ref);
                    let to = self.interface_node(target.name());
                    self.edge(from, to, EdgeKind::Use, false, decl.line);
                }
                DeclarationRecord::ImplementsInterface { reference } => {
                    let target = resolve_interface(reference, &aliases);
                    let to = self.interface_node(target.name());
                    self.edge(from, to, EdgeKind::Implements, false, decl.line);
                }
                DeclarationRecord::Invokes { target, .. } => match target {
                    InvokeTarget::Local(name) if self.index.contains(name) => {
                        self.edge(from, name.clone(), EdgeKind::Calls, true, decl.line);
                    }
                    InvokeTarget::Local(_) => {
                        let raw = target.raw();
                        let to = self.placeholder(external_id(&raw), NodeKind::ExternalRef, &raw);
                        self.edge(from, to, EdgeKind::Calls, false, decl.line);
                    }
                    InvokeTarget::External(text) => {
                        let to = self.placeholder(external_id(text), NodeKind::ExternalRef, text);
                        self.edge(from, to, EdgeKind::DynamicCall, false, decl.line);
                    }
                    InvokeTarget::Dynamic(text) => {
                        let to = self.placeholder(dynamic_id(text), NodeKind::Dynamic, text);
                        self.edge(from, to, EdgeKind::DynamicCall, false, decl.line);
                    }
                },
            }
        }
    }

    /// Finish the graph and run cycle detection over resolved calls.
    pub fn build(mut self) -> Graph {
        // Stable: keeps appearance order within a unit.
        self.edges.sort_by(|a, b| a.from.cmp(&b.from));

        let mut graph = Graph {
            nodes: self.nodes,
            edges: self.edges,
            cycles: Vec::new(),
        };
        graph.cycles = graph.call_cycles();

        tracing::debug!(
            "graph: {} nodes, {} edges, {} cycles",
            graph.nodes.len(),
            graph.edges.len(),
            graph.cycles.len()
        );
        graph
    }
}

/// Build the graph for every unit of an index.
pub fn build_graph(index: &SourceIndex, root: Option<&Path>) -> Graph {
    let mut builder = GraphBuilder::new(index, index.registry());
    if let Some(root) = root {
        builder = builder.with_root(root);
    }
    for source in index.units() {
        builder.add_unit(source);
    }
    builder.build()
}
