//! Topological sorting of deployable units.

use std::collections::{BTreeMap, BTreeSet};

use miette::Diagnostic as MietteDiagnostic;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use thiserror::Error;

use crate::graph::cycles::{find_cycles, format_cycle, Adjacency, Cycle};
use crate::order::DeploymentOrder;
use crate::util::diagnostic::{suggestions, Diagnostic};

/// The dependency graph contains at least one cycle; no order exists.
#[derive(Debug, Error, MietteDiagnostic)]
#[error("dependency cycle detected ({} cycle(s))", .cycles.len())]
#[diagnostic(
    code(berth::order::cycle),
    help("Break the cycle by removing a contract-call? or a depends_on entry")
)]
pub struct CycleError {
    pub cycles: Vec<Cycle>,
}

impl CycleError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let mut diag = Diagnostic::error("dependency cycle detected; cannot compute a deployment order");
        for cycle in &self.cycles {
            diag = diag.with_context(format!("cycle: {}", format_cycle(cycle)));
        }
        diag.with_suggestion(suggestions::BREAK_CYCLE)
    }
}

/// Computes one deterministic total order over named nodes.
///
/// Ties between nodes that are ready at the same time are broken
/// lexicographically, so the order only depends on the set of nodes and
/// dependencies, never on insertion order.
#[derive(Debug, Default)]
pub struct TopologicalSorter {
    /// Edges point from a dependency to its dependent.
    graph: DiGraph<String, ()>,
    indices: BTreeMap<String, NodeIndex>,
}

impl TopologicalSorter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node, returning its index. Adding an existing node is a no-op.
    pub fn add_node(&mut self, name: &str) -> NodeIndex {
        if let Some(&idx) = self.indices.get(name) {
            return idx;
        }
        let idx = self.graph.add_node(name.to_string());
        self.indices.insert(name.to_string(), idx);
        idx
    }

    /// Record that `dependent` must come after `dependency`.
    pub fn add_dependency(&mut self, dependent: &str, dependency: &str) {
        let from = self.add_node(dependency);
        let to = self.add_node(dependent);
        self.graph.update_edge(from, to, ());
    }

    /// Add every node and dependency of an adjacency map.
    pub fn extend(&mut self, deps: &Adjacency) {
        for (dependent, dependencies) in deps {
            self.add_node(dependent);
            for dependency in dependencies {
                self.add_dependency(dependent, dependency);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Sort with Kahn's algorithm.
    pub fn sort(&self) -> Result<DeploymentOrder, CycleError> {
        let mut in_degree: Vec<usize> = self
            .graph
            .node_indices()
            .map(|idx| self.graph.neighbors_directed(idx, Direction::Incoming).count())
            .collect();

        let mut ready: BTreeSet<&str> = self
            .graph
            .node_indices()
            .filter(|idx| in_degree[idx.index()] == 0)
            .map(|idx| self.graph[idx].as_str())
            .collect();

        let mut order = Vec::with_capacity(self.graph.node_count());
        while let Some(name) = ready.pop_first() {
            order.push(name.to_string());
            let Some(&idx) = self.indices.get(name) else {
                continue;
            };
            for next in self.graph.neighbors_directed(idx, Direction::Outgoing) {
                let degree = &mut in_degree[next.index()];
                *degree -= 1;
                if *degree == 0 {
                    ready.insert(self.graph[next].as_str());
                }
            }
        }

        if order.len() < self.graph.node_count() {
            let cycles = find_cycles(&self.dependency_adjacency());
            tracing::debug!("sort stopped after {} of {} nodes", order.len(), self.graph.node_count());
            return Err(CycleError { cycles });
        }

        Ok(DeploymentOrder::new(order))
    }

    /// Dependent to dependencies, for cycle reporting.
    fn dependency_adjacency(&self) -> Adjacency {
        let mut adj: Adjacency = self.indices.keys().map(|k| (k.clone(), Vec::new())).collect();
        for edge in self.graph.raw_edges() {
            let dependency = &self.graph[edge.source()];
            let dependent = &self.graph[edge.target()];
            adj.entry(dependent.clone()).or_default().push(dependency.clone());
        }
        for deps in adj.values_mut() {
            deps.sort();
        }
        adj
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain() {
        let mut sorter = TopologicalSorter::new();
        sorter.add_node("A");
        sorter.add_dependency("B", "A");
        sorter.add_dependency("C", "B");
        let order = sorter.sort().unwrap();
        assert_eq!(order.names(), &["A", "B", "C"]);
    }

    #[test]
    fn test_lexicographic_tie_break() {
        let mut sorter = TopologicalSorter::new();
        for name in ["zeta", "alpha", "mid"] {
            sorter.add_node(name);
        }
        sorter.add_dependency("alpha", "zeta");
        let order = sorter.sort().unwrap();
        assert_eq!(order.names(), &["mid", "zeta", "alpha"]);
    }

    #[test]
    fn test_insertion_order_does_not_matter() {
        let mut a = TopologicalSorter::new();
        a.add_dependency("c", "a");
        a.add_dependency("b", "a");
        a.add_node("d");

        let mut b = TopologicalSorter::new();
        b.add_node("d");
        b.add_dependency("b", "a");
        b.add_dependency("c", "a");
        b.add_dependency("c", "a");

        assert_eq!(a.sort().unwrap(), b.sort().unwrap());
        assert_eq!(a.sort().unwrap().names(), &["a", "b", "c", "d"]);
    }

    #[test]
    fn test_cycle_fails_without_partial_order() {
        let mut sorter = TopologicalSorter::new();
        sorter.add_dependency("A", "B");
        sorter.add_dependency("B", "A");
        sorter.add_dependency("C", "A");

        let err = sorter.sort().unwrap_err();
        assert_eq!(err.cycles, vec![vec!["A", "B", "A"]]);

        let diag = err.to_diagnostic();
        assert!(diag.is_error());
        assert_eq!(diag.context, vec!["cycle: A -> B -> A"]);
    }

    #[test]
    fn test_self_dependency_is_a_cycle() {
        let mut sorter = TopologicalSorter::new();
        sorter.add_dependency("A", "A");
        let err = sorter.sort().unwrap_err();
        assert_eq!(err.cycles, vec![vec!["A", "A"]]);
    }

    #[test]
    fn test_extend_from_adjacency() {
        let mut adj = Adjacency::new();
        adj.insert("N".into(), vec!["O".into()]);
        adj.insert("O".into(), vec!["M".into()]);
        adj.insert("M".into(), vec![]);

        let mut sorter = TopologicalSorter::new();
        sorter.extend(&adj);
        assert_eq!(sorter.len(), 3);
        assert_eq!(sorter.sort().unwrap().names(), &["M", "O", "N"]);
    }
}
