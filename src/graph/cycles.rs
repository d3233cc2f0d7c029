//! Cycle detection over an adjacency map.

use std::collections::{BTreeMap, HashSet};

/// Successor lists keyed by node id.
pub type Adjacency = BTreeMap<String, Vec<String>>;

/// A cycle path: the first node repeated at the end (`[A, B, A]`).
pub type Cycle = Vec<String>;

/// Find every cycle reachable in one depth-first pass.
///
/// Roots are visited in sorted order and successors in list order. Each back
/// edge to a node on the current path yields one cycle, so the result is
/// deterministic for a given adjacency. A self-edge is the cycle `[A, A]`.
pub fn find_cycles(adj: &Adjacency) -> Vec<Cycle> {
    let mut visited: HashSet<&str> = HashSet::new();
    let mut on_stack: HashSet<&str> = HashSet::new();
    let mut cycles = Vec::new();

    for root in adj.keys() {
        if !visited.insert(root.as_str()) {
            continue;
        }
        on_stack.insert(root.as_str());

        // (node, index of the next successor to explore)
        let mut frames: Vec<(&str, usize)> = vec![(root.as_str(), 0)];

        while let Some(&(node, idx)) = frames.last() {
            let next = adj.get(node).and_then(|succ| succ.get(idx));
            let Some(next) = next else {
                on_stack.remove(node);
                frames.pop();
                continue;
            };

            if let Some(top) = frames.last_mut() {
                top.1 += 1;
            }

            if on_stack.contains(next.as_str()) {
                if let Some(start) = frames.iter().position(|(n, _)| *n == next.as_str()) {
                    let mut cycle: Cycle = frames[start..].iter().map(|(n, _)| n.to_string()).collect();
                    cycle.push(next.clone());
                    tracing::debug!("cycle: {}", cycle.join(" -> "));
                    cycles.push(cycle);
                }
            } else if visited.insert(next.as_str()) {
                on_stack.insert(next.as_str());
                frames.push((next.as_str(), 0));
            }
        }
    }

    cycles
}

/// Render a cycle as `a -> b -> a`.
pub fn format_cycle(cycle: &[String]) -> String {
    cycle.join(" -> ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adjacency(edges: &[(&str, &str)]) -> Adjacency {
        let mut adj = Adjacency::new();
        for (from, to) in edges {
            adj.entry(from.to_string()).or_default().push(to.to_string());
            adj.entry(to.to_string()).or_default();
        }
        adj
    }

    #[test]
    fn test_acyclic() {
        let adj = adjacency(&[("c", "b"), ("b", "a"), ("c", "a")]);
        assert!(find_cycles(&adj).is_empty());
    }

    #[test]
    fn test_two_node_cycle() {
        let adj = adjacency(&[("A", "B"), ("B", "A")]);
        assert_eq!(find_cycles(&adj), vec![vec!["A", "B", "A"]]);
    }

    #[test]
    fn test_self_edge() {
        let adj = adjacency(&[("A", "A")]);
        assert_eq!(find_cycles(&adj), vec![vec!["A", "A"]]);
    }

    #[test]
    fn test_reports_all_cycles_in_one_pass() {
        let adj = adjacency(&[("a", "b"), ("b", "a"), ("c", "d"), ("d", "e"), ("e", "c")]);
        let cycles = find_cycles(&adj);
        assert_eq!(
            cycles,
            vec![vec!["a", "b", "a"], vec!["c", "d", "e", "c"]]
        );
        assert_eq!(format_cycle(&cycles[1]), "c -> d -> e -> c");
    }

    #[test]
    fn test_deep_chain_does_not_overflow() {
        let mut adj = Adjacency::new();
        for i in 0..100_000 {
            adj.insert(format!("n{}", i), vec![format!("n{}", i + 1)]);
        }
        adj.insert("n100000".to_string(), vec!["n0".to_string()]);
        let cycles = find_cycles(&adj);
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].len(), 100_002);
    }
}
