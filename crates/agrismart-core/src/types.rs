//! Scan request data model
//!
//! Records serialize with camelCase field names and snake_case enum values.

use crate::state_machine::RequestStatus;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Scan request identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub String);

impl RequestId {
    /// Generate a new sortable identifier (`REQ-<ulid>`)
    #[inline]
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("REQ-{}", Ulid::new()))
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RequestId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Payment state of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Paid,
    #[default]
    Pending,
    Failed,
    Refunded,
}

/// Handling priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    #[default]
    Normal,
    High,
    Urgent,
}

/// GPS position of a farm
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Where the farm is
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub region: String,
    pub coordinates: Coordinates,
    pub address: String,
}

/// Disease severity reported by analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiseaseSeverity {
    Low,
    Moderate,
    High,
    Critical,
}

/// Disease family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiseaseCategory {
    Fungal,
    Bacterial,
    Viral,
    Nutrient,
    Pest,
    Physical,
}

/// One finding attached when analysis completes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Detection {
    pub id: String,
    pub disease_name: String,
    pub category: DiseaseCategory,
    pub severity: DiseaseSeverity,
    /// Model confidence, percent
    pub confidence: f64,
    /// Share of the field affected, percent
    pub affected_area: f64,
    pub description: String,
    pub treatment: String,
}

/// A farmer's drone-scan order
///
/// `status` has no public setter. It changes only through
/// [`transition_status`](crate::lifecycle::transition_status) and
/// [`advance`](crate::lifecycle::advance), which enforce the transition graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    pub id: RequestId,
    pub farmer_id: String,
    pub farmer_name: String,
    pub farmer_phone: String,
    pub farm_name: String,
    pub location: Location,
    pub hectares: f64,
    pub crop_type: String,
    pub request_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_date: Option<NaiveDate>,
    status: RequestStatus,
    pub payment_status: PaymentStatus,
    /// Whole currency units
    pub payment_amount: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_operator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_agronomist: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drone_images: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_progress: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detections: Option<Vec<Detection>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_url: Option<String>,
}

impl ScanRequest {
    /// Current lifecycle status
    #[inline]
    #[must_use]
    pub fn status(&self) -> RequestStatus {
        self.status
    }

    #[inline]
    pub(crate) fn set_status(&mut self, status: RequestStatus) {
        self.status = status;
    }

    /// Whether the request has left the pipeline
    #[inline]
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Number of detections attached so far
    #[must_use]
    pub fn detection_count(&self) -> usize {
        self.detections.as_ref().map_or(0, Vec::len)
    }
}

/// Order details as submitted by a farmer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewScanRequest {
    pub farmer_id: String,
    pub farmer_name: String,
    pub farmer_phone: String,
    pub farm_name: String,
    pub location: Location,
    pub hectares: f64,
    pub crop_type: String,
    pub payment_amount: u64,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewScanRequest {
    /// Create the request record in `PendingApproval`
    #[must_use]
    pub fn into_request(self, id: RequestId, request_date: NaiveDate) -> ScanRequest {
        ScanRequest {
            id,
            farmer_id: self.farmer_id,
            farmer_name: self.farmer_name,
            farmer_phone: self.farmer_phone,
            farm_name: self.farm_name,
            location: self.location,
            hectares: self.hectares,
            crop_type: self.crop_type,
            request_date,
            scheduled_date: None,
            completed_date: None,
            status: RequestStatus::INITIAL,
            payment_status: self.payment_status,
            payment_amount: self.payment_amount,
            assigned_operator: None,
            assigned_agronomist: None,
            priority: self.priority,
            notes: self.notes,
            drone_images: None,
            analysis_progress: None,
            detections: None,
            report_url: None,
        }
    }

    /// Create the request with a fresh id, dated today (UTC)
    #[must_use]
    pub fn submit(self) -> ScanRequest {
        self.into_request(RequestId::generate(), Utc::now().date_naive())
    }
}
