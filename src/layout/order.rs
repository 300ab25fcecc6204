//! Cycle-tolerant topological ordering.

use crate::model::ProcessGraph;
use std::collections::{HashMap, VecDeque};

/// Linear node ordering over indices into `ProcessGraph::nodes`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeOrdering {
    pub order: Vec<usize>,
    /// Trailing nodes that sat on a cycle and were appended in input order
    pub unresolved: usize,
}

/// Build node id lookup: id -> index of first occurrence.
pub fn build_node_index(graph: &ProcessGraph) -> HashMap<&str, usize> {
    let mut index = HashMap::with_capacity(graph.nodes.len());
    for (i, node) in graph.nodes.iter().enumerate() {
        index.entry(node.id.as_str()).or_insert(i);
    }
    index
}

/// Kahn's algorithm with a FIFO queue seeded in input order.
///
/// Nodes that never reach zero in-degree are appended afterwards in input
/// order, so every node appears exactly once even when the graph is cyclic.
/// Edges with an unknown endpoint are ignored.
pub fn topological_order(graph: &ProcessGraph) -> NodeOrdering {
    let n = graph.nodes.len();
    let index = build_node_index(graph);

    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut in_degree = vec![0usize; n];
    for edge in &graph.edges {
        let (Some(&from), Some(&to)) = (index.get(edge.from.as_str()), index.get(edge.to.as_str()))
        else {
            continue;
        };
        successors[from].push(to);
        in_degree[to] += 1;
    }

    let mut queue: VecDeque<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
    let mut placed = vec![false; n];
    let mut order = Vec::with_capacity(n);

    while let Some(current) = queue.pop_front() {
        placed[current] = true;
        order.push(current);
        for &next in &successors[current] {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                queue.push_back(next);
            }
        }
    }

    let resolved = order.len();
    order.extend((0..n).filter(|&i| !placed[i]));
    let unresolved = order.len() - resolved;
    if unresolved > 0 {
        tracing::debug!(unresolved, "appended cyclic residue in input order");
    }

    NodeOrdering { order, unresolved }
}
