//! Redundant dependency detection.

use std::collections::{HashSet, VecDeque};

use crate::graph::Adjacency;

fn reachable(adj: &Adjacency, from: &str, to: &str) -> bool {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut queue: VecDeque<&str> = VecDeque::from([from]);
    while let Some(node) = queue.pop_front() {
        for next in adj.get(node).into_iter().flatten() {
            if next == to {
                return true;
            }
            if seen.insert(next.as_str()) {
                queue.push_back(next.as_str());
            }
        }
    }
    false
}

/// The direct dependencies of `name` worth keeping, in their original order.
///
/// A dependency is dropped when it repeats an earlier one, or when another
/// direct dependency already reaches it (and it does not reach back). The
/// transitive closure of `adj` is unchanged by the removal.
pub fn essential_dependencies(adj: &Adjacency, name: &str) -> Vec<String> {
    let Some(direct) = adj.get(name) else {
        return Vec::new();
    };

    let mut unique: Vec<&str> = Vec::with_capacity(direct.len());
    for dep in direct {
        if !unique.contains(&dep.as_str()) {
            unique.push(dep);
        }
    }

    unique
        .iter()
        .filter(|&&dep| {
            !unique.iter().any(|&other| {
                other != dep
                    && other != name
                    && reachable(adj, other, dep)
                    && !reachable(adj, dep, other)
            })
        })
        .map(|dep| dep.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adj(entries: &[(&str, &[&str])]) -> Adjacency {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.iter().map(|s| s.to_string()).collect()))
            .collect()
    }

    #[test]
    fn test_drops_transitively_implied() {
        let graph = adj(&[("c", &["a", "b"]), ("b", &["a"]), ("a", &[])]);
        assert_eq!(essential_dependencies(&graph, "c"), vec!["b"]);
    }

    #[test]
    fn test_drops_duplicates_keeps_order() {
        let graph = adj(&[("x", &["m", "k", "m"]), ("m", &[]), ("k", &[])]);
        assert_eq!(essential_dependencies(&graph, "x"), vec!["m", "k"]);
    }

    #[test]
    fn test_mutually_reachable_deps_are_kept() {
        let graph = adj(&[("x", &["p", "q"]), ("p", &["q"]), ("q", &["p"])]);
        assert_eq!(essential_dependencies(&graph, "x"), vec!["p", "q"]);
    }

    #[test]
    fn test_unknown_entry() {
        assert!(essential_dependencies(&Adjacency::new(), "x").is_empty());
    }
}
