//! Request status state machine
//!
//! The transition table is an exhaustive `match`: adding a status does not
//! compile until its successors, label and color are defined.

pub mod graph;

use crate::error::{LifecycleError, ParseStatusError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle stage of a scan request
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    /// Submitted by the farmer, waiting for operations staff
    PendingApproval,
    /// Accepted, waiting for a date and operator
    Approved,
    /// Flight booked
    Scheduled,
    /// Drone flight under way
    InProgress,
    /// Imagery uploaded, waiting for analysis
    AwaitingAnalysis,
    /// Detections attached
    AnalysisComplete,
    /// Waiting for an agronomist to confirm the detections
    ValidationRequired,
    /// Report delivered
    Completed,
    /// Declined by operations staff
    Rejected,
}

impl RequestStatus {
    /// Every status, in lifecycle order
    pub const ALL: [RequestStatus; 9] = [
        RequestStatus::PendingApproval,
        RequestStatus::Approved,
        RequestStatus::Scheduled,
        RequestStatus::InProgress,
        RequestStatus::AwaitingAnalysis,
        RequestStatus::AnalysisComplete,
        RequestStatus::ValidationRequired,
        RequestStatus::Completed,
        RequestStatus::Rejected,
    ];

    /// Status every new request starts in
    pub const INITIAL: RequestStatus = RequestStatus::PendingApproval;

    /// Statuses reachable in one step
    #[must_use]
    pub const fn successors(self) -> &'static [RequestStatus] {
        use RequestStatus::*;
        match self {
            PendingApproval => &[Approved, Rejected],
            Approved => &[Scheduled],
            Scheduled => &[InProgress],
            InProgress => &[AwaitingAnalysis],
            AwaitingAnalysis => &[AnalysisComplete],
            AnalysisComplete => &[ValidationRequired],
            ValidationRequired => &[Completed],
            Completed => &[],
            Rejected => &[],
        }
    }

    /// Whether the request has left the pipeline for good
    #[inline]
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, RequestStatus::Completed | RequestStatus::Rejected)
    }

    /// Wire name (`pending_approval`, `in_progress`, ...)
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            RequestStatus::PendingApproval => "pending_approval",
            RequestStatus::Approved => "approved",
            RequestStatus::Scheduled => "scheduled",
            RequestStatus::InProgress => "in_progress",
            RequestStatus::AwaitingAnalysis => "awaiting_analysis",
            RequestStatus::AnalysisComplete => "analysis_complete",
            RequestStatus::ValidationRequired => "validation_required",
            RequestStatus::Completed => "completed",
            RequestStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RequestStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ParseStatusError(s.to_string()))
    }
}

/// Whether `to` is a direct successor of `from`.
///
/// Total over every pair; self loops are never allowed.
#[inline]
#[must_use]
pub fn can_transition(from: RequestStatus, to: RequestStatus) -> bool {
    from.successors().contains(&to)
}

/// Default next status for single-successor states.
///
/// Returns `None` for terminal states and for `PendingApproval`, where the
/// caller must choose between approval and rejection explicitly.
#[must_use]
pub fn next_status(current: RequestStatus) -> Option<RequestStatus> {
    match current.successors() {
        [only] => Some(*only),
        _ => None,
    }
}

/// Validates a state transition.
///
/// # Errors
/// `LifecycleError::InvalidTransition` carrying the attempted pair.
pub fn validate_transition(from: RequestStatus, to: RequestStatus) -> Result<(), LifecycleError> {
    if can_transition(from, to) {
        Ok(())
    } else {
        tracing::warn!(%from, %to, "rejected illegal status transition");
        Err(LifecycleError::InvalidTransition { from, to })
    }
}
