// src/quantum/hypergraph.rs
//! Qubit connectivity bookkeeping
//!
//! Records which qubits have appeared together in a gate. The graph is only
//! used for reporting; it never influences simulation results.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Undirected adjacency list over qubit indices
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hypergraph {
    adjacency: BTreeMap<usize, BTreeSet<usize>>,
}

impl Hypergraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// A graph with isolated nodes `0..node_count`
    pub fn with_nodes(node_count: usize) -> Self {
        let mut graph = Self::new();
        for node in 0..node_count {
            graph.add_node(node);
        }
        graph
    }

    pub fn add_node(&mut self, node: usize) {
        self.adjacency.entry(node).or_default();
    }

    /// Add an edge between every pair of distinct `nodes`
    pub fn connect_nodes(&mut self, nodes: &[usize]) {
        for &node in nodes {
            self.add_node(node);
        }

        for (i, &a) in nodes.iter().enumerate() {
            for &b in &nodes[i + 1..] {
                if a == b {
                    continue;
                }
                self.adjacency.entry(a).or_default().insert(b);
                self.adjacency.entry(b).or_default().insert(a);
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(BTreeSet::len).sum::<usize>() / 2
    }

    /// Neighbors of `node` in ascending order
    pub fn neighbors(&self, node: usize) -> Vec<usize> {
        self.adjacency
            .get(&node)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn are_connected(&self, a: usize, b: usize) -> bool {
        self.adjacency.get(&a).map_or(false, |set| set.contains(&b))
    }

    /// Number of neighbors of `node`
    pub fn degree(&self, node: usize) -> usize {
        self.adjacency.get(&node).map_or(0, BTreeSet::len)
    }
}

impl fmt::Display for Hypergraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (node, neighbors) in &self.adjacency {
            let list: Vec<String> = neighbors.iter().map(|n| n.to_string()).collect();
            writeln!(f, "q{} -> [{}]", node, list.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_all_pairs() {
        let mut graph = Hypergraph::with_nodes(4);
        graph.connect_nodes(&[0, 2, 3]);

        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.edge_count(), 3);
        assert!(graph.are_connected(2, 0));
        assert!(graph.are_connected(3, 2));
        assert!(!graph.are_connected(1, 0));
        assert_eq!(graph.neighbors(0), vec![2, 3]);
        assert_eq!(graph.degree(1), 0);
    }

    #[test]
    fn test_repeated_edges_are_counted_once() {
        let mut graph = Hypergraph::new();
        graph.connect_nodes(&[0, 1]);
        graph.connect_nodes(&[1, 0]);
        graph.connect_nodes(&[5]);

        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.to_string(), "q0 -> [1]\nq1 -> [0]\nq5 -> []\n");
    }
}
