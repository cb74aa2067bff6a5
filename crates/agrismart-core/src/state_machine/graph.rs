//! Structural checks over the transition graph

use super::RequestStatus;
use crate::error::GraphError;
use petgraph::graphmap::DiGraphMap;
use petgraph::visit::Dfs;
use petgraph::Direction;
use std::collections::BTreeSet;

/// Summary of a verified graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphReport {
    pub statuses: usize,
    pub transitions: usize,
    pub terminals: Vec<RequestStatus>,
}

/// Builds the transition graph from the static successor table
#[must_use]
pub fn transition_graph() -> DiGraphMap<RequestStatus, ()> {
    let mut graph = DiGraphMap::new();
    for from in RequestStatus::ALL {
        graph.add_node(from);
        for &to in from.successors() {
            graph.add_edge(from, to, ());
        }
    }
    graph
}

/// Verifies the shipped transition graph
///
/// # Errors
/// Returns the first structural violation found.
pub fn verify_graph() -> Result<GraphReport, GraphError> {
    check_graph(&transition_graph())
}

/// Checks a graph over `RequestStatus`:
/// acyclic, no self loops, everything reachable from the initial status,
/// terminals have no edges, non-terminals have at least one.
///
/// # Errors
/// Returns the first structural violation found.
pub fn check_graph(graph: &DiGraphMap<RequestStatus, ()>) -> Result<GraphReport, GraphError> {
    if let Some((status, _, _)) = graph.all_edges().find(|(from, to, _)| from == to) {
        return Err(GraphError::SelfLoop(status));
    }

    if petgraph::algo::is_cyclic_directed(graph) {
        return Err(GraphError::CycleDetected);
    }

    let mut reachable = BTreeSet::new();
    if graph.contains_node(RequestStatus::INITIAL) {
        let mut dfs = Dfs::new(graph, RequestStatus::INITIAL);
        while let Some(status) = dfs.next(graph) {
            reachable.insert(status);
        }
    }

    for status in RequestStatus::ALL {
        if !reachable.contains(&status) {
            return Err(GraphError::Unreachable(status));
        }

        let outgoing = graph.neighbors_directed(status, Direction::Outgoing).count();
        match (status.is_terminal(), outgoing) {
            (true, n) if n > 0 => return Err(GraphError::TerminalHasSuccessors(status)),
            (false, 0) => return Err(GraphError::DeadEnd(status)),
            _ => {}
        }
    }

    Ok(GraphReport {
        statuses: graph.node_count(),
        transitions: graph.edge_count(),
        terminals: RequestStatus::ALL
            .into_iter()
            .filter(|s| s.is_terminal())
            .collect(),
    })
}
