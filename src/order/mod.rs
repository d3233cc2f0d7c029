//! Deployment ordering.

pub mod prune;
pub mod sort;

use std::collections::HashMap;

use serde::Serialize;

pub use sort::{CycleError, TopologicalSorter};

/// A total order of unit names in which every dependency precedes its
/// dependents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DeploymentOrder {
    names: Vec<String>,
}

impl DeploymentOrder {
    pub fn new(names: Vec<String>) -> Self {
        DeploymentOrder { names }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Position of each name in the order.
    pub fn ranks(&self) -> HashMap<&str, usize> {
        self.iter().enumerate().map(|(i, name)| (name, i)).collect()
    }

    /// Check that every dependency in `deps` comes before its dependent.
    pub fn satisfies(&self, deps: &crate::graph::Adjacency) -> bool {
        let ranks = self.ranks();
        deps.iter().all(|(dependent, dependencies)| {
            dependencies.iter().all(|dependency| {
                match (ranks.get(dependency.as_str()), ranks.get(dependent.as_str())) {
                    (Some(a), Some(b)) => a < b,
                    _ => false,
                }
            })
        })
    }
}

impl<'a> IntoIterator for &'a DeploymentOrder {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.names.iter()
    }
}
