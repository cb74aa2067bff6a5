//! Activity feed
//!
//! Append-only record of lifecycle events, hash-chained so that edits to
//! past entries are detectable.

use crate::error::LogError;
use agrismart_core::{RequestId, RequestStatus};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Unique identifier for an activity entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActivityId(pub Uuid);

impl ActivityId {
    /// Fresh random id
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ActivityId {
    fn default() -> Self {
        Self::new()
    }
}

/// What happened, as shown in the activity feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    /// Order submitted
    Request,
    /// Admin approved
    Approval,
    /// Admin rejected
    Rejection,
    /// Flight booked
    Schedule,
    /// Drone flight started
    Scan,
    /// Imagery uploaded
    Upload,
    /// Detections attached
    Analysis,
    /// Sent to an agronomist
    Validation,
    /// Report ready
    Completion,
}

impl ActivityKind {
    /// Kind of event for entering `status`
    #[must_use]
    pub fn for_status(status: RequestStatus) -> Self {
        match status {
            RequestStatus::PendingApproval => ActivityKind::Request,
            RequestStatus::Approved => ActivityKind::Approval,
            RequestStatus::Rejected => ActivityKind::Rejection,
            RequestStatus::Scheduled => ActivityKind::Schedule,
            RequestStatus::InProgress => ActivityKind::Scan,
            RequestStatus::AwaitingAnalysis => ActivityKind::Upload,
            RequestStatus::AnalysisComplete => ActivityKind::Analysis,
            RequestStatus::ValidationRequired => ActivityKind::Validation,
            RequestStatus::Completed => ActivityKind::Completion,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            ActivityKind::Request => 0,
            ActivityKind::Approval => 1,
            ActivityKind::Rejection => 2,
            ActivityKind::Schedule => 3,
            ActivityKind::Scan => 4,
            ActivityKind::Upload => 5,
            ActivityKind::Analysis => 6,
            ActivityKind::Validation => 7,
            ActivityKind::Completion => 8,
        }
    }
}

/// One entry in the activity feed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    /// Entry id
    pub id: ActivityId,
    /// When the entry was created
    pub timestamp: DateTime<Utc>,
    /// Request the event belongs to
    pub request_id: RequestId,
    /// Event kind, derived from `status`
    pub kind: ActivityKind,
    /// Status the request entered
    pub status: RequestStatus,
    /// Human-readable summary
    pub message: String,
    /// Hash of the previous entry, zero for the first
    pub prev_hash: [u8; 32],
    /// SHA-256 over this entry's fields and `prev_hash`
    pub hash: [u8; 32],
}

impl Activity {
    /// Entry for `request_id` entering `status`; hashes are filled on append
    #[must_use]
    pub fn new(request_id: RequestId, status: RequestStatus, message: impl Into<String>) -> Self {
        Self {
            id: ActivityId::new(),
            timestamp: Utc::now(),
            request_id,
            kind: ActivityKind::for_status(status),
            status,
            message: message.into(),
            prev_hash: [0u8; 32],
            hash: [0u8; 32],
        }
    }

    /// `hash` as lowercase hex
    #[must_use]
    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash)
    }
}

/// Append-only, hash-chained activity feed
#[derive(Debug, Default)]
pub struct ActivityLog {
    inner: Mutex<Vec<Activity>>,
}

impl ActivityLog {
    /// Chain `activity` onto the last entry and store it
    pub fn append(&self, mut activity: Activity) -> ActivityId {
        let mut guard = self.inner.lock();
        activity.prev_hash = guard.last().map_or([0u8; 32], |a| a.hash);
        activity.hash = compute_hash(&activity);
        let id = activity.id;
        guard.push(activity);
        id
    }

    /// Snapshot of every entry, oldest first
    #[must_use]
    pub fn entries(&self) -> Vec<Activity> {
        self.inner.lock().clone()
    }

    /// Entries for one request, oldest first
    #[must_use]
    pub fn for_request(&self, request_id: &RequestId) -> Vec<Activity> {
        self.inner
            .lock()
            .iter()
            .filter(|a| &a.request_id == request_id)
            .cloned()
            .collect()
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Whether nothing has been logged
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Recompute the chain from the first entry
    ///
    /// # Errors
    /// `LogError::IntegrityViolation` with the index of the first entry whose
    /// link or hash does not match.
    pub fn verify_integrity(&self) -> Result<(), LogError> {
        let guard = self.inner.lock();
        let mut prev = [0u8; 32];
        for (i, a) in guard.iter().enumerate() {
            if a.prev_hash != prev || a.hash != compute_hash(a) {
                return Err(LogError::IntegrityViolation(i));
            }
            prev = a.hash;
        }
        Ok(())
    }

    #[cfg(test)]
    fn tamper(&self, index: usize, message: &str) {
        self.inner.lock()[index].message = message.to_string();
    }
}

fn compute_hash(activity: &Activity) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(activity.id.0.as_bytes());
    hasher.update(activity.timestamp.timestamp_micros().to_le_bytes());
    hasher.update(activity.request_id.as_str().as_bytes());
    hasher.update([0]);
    hasher.update([activity.kind.as_u8()]);
    hasher.update(activity.status.as_str().as_bytes());
    hasher.update([0]);
    hasher.update(activity.message.as_bytes());
    hasher.update([0]);
    hasher.update(activity.prev_hash);
    hasher.finalize().into()
}
