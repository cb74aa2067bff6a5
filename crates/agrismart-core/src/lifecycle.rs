//! Checked transitions
//!
//! The only way to change a request's status. Both functions leave the input
//! untouched and return a new record.

use crate::error::LifecycleError;
use crate::state_machine::{validate_transition, RequestStatus};
use crate::types::ScanRequest;

/// Move `request` to `new_status`, changing nothing else.
///
/// # Errors
/// `LifecycleError::InvalidTransition` if `new_status` is not a direct
/// successor of the current status. Never clamps to another status.
pub fn transition_status(
    request: &ScanRequest,
    new_status: RequestStatus,
) -> Result<ScanRequest, LifecycleError> {
    advance(request, new_status, |_| {})
}

/// Move `request` to `new_status` and fill in the fields the transition
/// unlocks (scheduled date, detections, report URL, ...).
///
/// `unlock` runs on the copy before the status is written, so it cannot
/// change the resulting status.
///
/// # Errors
/// `LifecycleError::InvalidTransition`, checked before `unlock` runs.
pub fn advance<F>(
    request: &ScanRequest,
    new_status: RequestStatus,
    unlock: F,
) -> Result<ScanRequest, LifecycleError>
where
    F: FnOnce(&mut ScanRequest),
{
    let from = request.status();
    validate_transition(from, new_status)?;

    let mut next = request.clone();
    unlock(&mut next);
    next.set_status(new_status);

    tracing::debug!(request_id = %request.id, %from, to = %new_status, "status transition");
    Ok(next)
}
