//! DAG validation — run this before executing a workflow.
//!
//! Rules enforced:
//! 1. Node IDs must be unique within the workflow.
//! 2. Every edge must reference valid node IDs (both `from` and `to`).
//! 3. The directed graph must be acyclic.
//!
//! Returns the node IDs in execution order. The order is deterministic:
//! among nodes that are ready at the same time, the one declared first runs
//! first.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use crate::{models::Workflow, EngineError};

/// Validate the workflow's DAG and return nodes in topological execution order.
///
/// # Errors
/// - [`EngineError::DuplicateNodeId`] if two nodes share an ID.
/// - [`EngineError::UnknownNodeReference`] if an edge references a missing node.
/// - [`EngineError::CycleDetected`] if the graph is not acyclic.
pub fn validate_dag(workflow: &Workflow) -> Result<Vec<String>, EngineError> {
    // Declaration position of every node; doubles as the uniqueness check.
    let mut position: HashMap<&str, usize> = HashMap::with_capacity(workflow.nodes.len());
    for (i, node) in workflow.nodes.iter().enumerate() {
        if position.insert(node.id.as_str(), i).is_some() {
            return Err(EngineError::DuplicateNodeId(node.id.clone()));
        }
    }

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); workflow.nodes.len()];
    let mut in_degree: Vec<usize> = vec![0; workflow.nodes.len()];
    let mut seen_edges: HashSet<(usize, usize)> = HashSet::new();

    for edge in &workflow.edges {
        let from = *position.get(edge.from.as_str()).ok_or_else(|| {
            EngineError::UnknownNodeReference {
                node_id: edge.from.clone(),
                side: "from",
            }
        })?;
        let to = *position.get(edge.to.as_str()).ok_or_else(|| {
            EngineError::UnknownNodeReference {
                node_id: edge.to.clone(),
                side: "to",
            }
        })?;

        // Parallel edges would double-count the in-degree.
        if seen_edges.insert((from, to)) {
            children[from].push(to);
            in_degree[to] += 1;
        }
    }

    // Kahn's algorithm; the ready set always yields the earliest-declared node.
    let mut ready: BinaryHeap<Reverse<usize>> = (0..workflow.nodes.len())
        .filter(|&i| in_degree[i] == 0)
        .map(Reverse)
        .collect();
    let mut order: Vec<String> = Vec::with_capacity(workflow.nodes.len());

    while let Some(Reverse(i)) = ready.pop() {
        order.push(workflow.nodes[i].id.clone());
        for &child in &children[i] {
            in_degree[child] -= 1;
            if in_degree[child] == 0 {
                ready.push(Reverse(child));
            }
        }
    }

    if order.len() != workflow.nodes.len() {
        return Err(EngineError::CycleDetected);
    }

    Ok(order)
}
