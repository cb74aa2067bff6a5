use agrismart_core::state_machine::graph::transition_graph;
use agrismart_core::{can_transition, next_status, validate_transition, RequestStatus};
use petgraph::visit::Dfs;
use proptest::prelude::*;
use RequestStatus::*;

/// The transition graph written out edge by edge.
const EDGES: [(RequestStatus, RequestStatus); 8] = [
    (PendingApproval, Approved),
    (PendingApproval, Rejected),
    (Approved, Scheduled),
    (Scheduled, InProgress),
    (InProgress, AwaitingAnalysis),
    (AwaitingAnalysis, AnalysisComplete),
    (AnalysisComplete, ValidationRequired),
    (ValidationRequired, Completed),
];

fn any_status() -> impl Strategy<Value = RequestStatus> {
    prop_oneof![
        Just(PendingApproval),
        Just(Approved),
        Just(Scheduled),
        Just(InProgress),
        Just(AwaitingAnalysis),
        Just(AnalysisComplete),
        Just(ValidationRequired),
        Just(Completed),
        Just(Rejected),
    ]
}

#[test]
fn can_transition_matches_edge_list_exactly() {
    for from in RequestStatus::ALL {
        for to in RequestStatus::ALL {
            assert_eq!(
                can_transition(from, to),
                EDGES.contains(&(from, to)),
                "{from} -> {to}"
            );
        }
    }
}

#[test]
fn terminal_states_have_no_way_out() {
    for to in RequestStatus::ALL {
        assert!(!can_transition(Completed, to));
        assert!(!can_transition(Rejected, to));
    }
}

#[test]
fn nothing_re_enters_initial_state() {
    for from in RequestStatus::ALL {
        assert!(!can_transition(from, PendingApproval));
    }
}

#[test]
fn every_status_reachable_from_pending_approval() {
    let graph = transition_graph();
    let mut dfs = Dfs::new(&graph, PendingApproval);
    let mut seen = Vec::new();
    while let Some(status) = dfs.next(&graph) {
        seen.push(status);
    }

    for status in RequestStatus::ALL {
        assert!(seen.contains(&status), "{status} unreachable");
        if !status.is_terminal() {
            assert!(!status.successors().is_empty(), "{status} is a dead end");
        }
    }
}

#[test]
fn linear_walk_reaches_completed() {
    let mut current = Approved;
    let mut steps = 0;
    while let Some(next) = next_status(current) {
        current = next;
        steps += 1;
    }
    assert_eq!(current, Completed);
    assert_eq!(steps, 6);
}

proptest! {
    #[test]
    fn prop_validate_agrees_with_can_transition(from in any_status(), to in any_status()) {
        let res = validate_transition(from, to);
        prop_assert_eq!(res.is_ok(), can_transition(from, to));
        if let Err(err) = res {
            prop_assert_eq!(err.attempted(), (from, to));
        }
    }

    #[test]
    fn prop_no_self_loops(status in any_status()) {
        prop_assert!(!can_transition(status, status));
    }

    #[test]
    fn prop_next_status_is_a_successor(status in any_status()) {
        match next_status(status) {
            Some(next) => {
                prop_assert!(can_transition(status, next));
                prop_assert_eq!(status.successors().len(), 1);
            }
            None => prop_assert!(status.successors().len() != 1),
        }
    }

    #[test]
    fn prop_every_status_has_label_and_color(status in any_status()) {
        prop_assert!(!status.label().is_empty());
        let _ = status.color();
    }
}
