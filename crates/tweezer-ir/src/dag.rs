//! Resource dependency graph over a circuit's operations.

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use rustc_hash::FxHashMap;

use crate::circuit::Circuit;
use crate::operation::Resource;

/// Directed graph with one node per top-level operation.
///
/// An edge `a → b` means `b` is the next operation after `a` on some shared
/// qubit or classical bit. Edges therefore always point forward in program
/// order.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    graph: DiGraph<usize, Resource>,
    barriers: Vec<bool>,
}

impl DependencyGraph {
    /// Build the graph for a circuit.
    pub fn build(circuit: &Circuit) -> Self {
        let mut graph = DiGraph::with_capacity(circuit.len(), circuit.len());
        let mut last: FxHashMap<Resource, NodeIndex> = FxHashMap::default();
        let mut barriers = Vec::with_capacity(circuit.len());

        for (i, op) in circuit.iter().enumerate() {
            let node = graph.add_node(i);
            barriers.push(op.is_barrier());
            for resource in circuit.footprint(op) {
                if let Some(prev) = last.insert(resource.clone(), node) {
                    if graph.find_edge(prev, node).is_none() {
                        graph.add_edge(prev, node, resource);
                    }
                }
            }
        }

        Self { graph, barriers }
    }

    /// Number of operations.
    pub fn num_nodes(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of dependency edges.
    pub fn num_edges(&self) -> usize {
        self.graph.edge_count()
    }

    /// All dependency edges as `(earlier, later)` operation indices.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.graph
            .edge_references()
            .map(|e| (self.graph[e.source()], self.graph[e.target()]))
    }

    /// Immediate predecessors of an operation.
    pub fn predecessors(&self, op: usize) -> Vec<usize> {
        if op >= self.graph.node_count() {
            return Vec::new();
        }
        let mut preds: Vec<usize> = self
            .graph
            .neighbors_directed(NodeIndex::new(op), Direction::Incoming)
            .map(|n| self.graph[n])
            .collect();
        preds.sort_unstable();
        preds
    }

    /// ASAP level of every operation. Barriers take no time.
    pub fn levels(&self) -> Vec<usize> {
        let order = petgraph::algo::toposort(&self.graph, None)
            .unwrap_or_else(|_| self.graph.node_indices().collect());
        let mut levels = vec![0usize; self.graph.node_count()];
        for node in order {
            let start = self
                .graph
                .edges_directed(node, Direction::Incoming)
                .map(|e| levels[e.source().index()])
                .max()
                .unwrap_or(0);
            let cost = usize::from(!self.barriers[node.index()]);
            levels[node.index()] = start + cost;
        }
        levels
    }

    /// Length of the longest dependency chain.
    pub fn depth(&self) -> usize {
        self.levels().into_iter().max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qubit::{Clbit, Qubit};

    fn q(i: u32) -> Qubit {
        Qubit::new("q", i)
    }

    #[test]
    fn test_edges_follow_shared_resources() {
        let mut circuit = Circuit::with_size("test", 3, 1);
        circuit
            .h(q(0))
            .unwrap()
            .h(q(2))
            .unwrap()
            .cx(q(0), q(1))
            .unwrap()
            .measure(q(1), Clbit::new("c", 0))
            .unwrap();

        let dag = circuit.dependency_graph();
        assert_eq!(dag.num_nodes(), 4);
        let mut edges: Vec<_> = dag.edges().collect();
        edges.sort_unstable();
        assert_eq!(edges, vec![(0, 2), (2, 3)]);
        assert_eq!(dag.predecessors(2), vec![0]);
        assert!(dag.predecessors(1).is_empty());
    }

    #[test]
    fn test_shared_pair_has_single_edge() {
        let mut circuit = Circuit::with_size("test", 2, 0);
        circuit.cz(q(0), q(1)).unwrap().cz(q(0), q(1)).unwrap();
        let dag = circuit.dependency_graph();
        assert_eq!(dag.num_edges(), 1);
        assert_eq!(dag.levels(), vec![1, 2]);
    }

    #[test]
    fn test_empty_circuit_depth() {
        assert_eq!(Circuit::new("empty").depth(), 0);
    }
}
