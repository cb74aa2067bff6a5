//! Error types for the lifecycle core

use crate::state_machine::RequestStatus;

/// Lifecycle error
///
/// Raised only by the checked transition functions. Every other operation in
/// this crate is total over well-typed inputs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    /// `to` is not a direct successor of `from`
    #[error("cannot transition from {from} to {to}")]
    InvalidTransition {
        /// Status the request was in
        from: RequestStatus,
        /// Status that was requested
        to: RequestStatus,
    },
}

impl LifecycleError {
    /// The attempted `(from, to)` pair
    #[inline]
    #[must_use]
    pub fn attempted(&self) -> (RequestStatus, RequestStatus) {
        match self {
            Self::InvalidTransition { from, to } => (*from, *to),
        }
    }
}

/// Unknown status name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown request status: {0:?}")]
pub struct ParseStatusError(pub String);

/// Transition graph verification errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// The graph contains a cycle
    #[error("transition graph contains a cycle")]
    CycleDetected,

    /// A status lists itself as a successor
    #[error("self loop on {0}")]
    SelfLoop(RequestStatus),

    /// A status cannot be reached from the initial status
    #[error("{0} is unreachable from pending_approval")]
    Unreachable(RequestStatus),

    /// A non-terminal status has no outgoing edge
    #[error("{0} is not terminal but has no successors")]
    DeadEnd(RequestStatus),

    /// A terminal status has an outgoing edge
    #[error("terminal status {0} has successors")]
    TerminalHasSuccessors(RequestStatus),
}
