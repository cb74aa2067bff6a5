//! Testing utilities for the AgriSmart workspace
//!
//! Shared fixtures and progress recorders.

use agrismart_core::{
    advance, Coordinates, Detection, DiseaseCategory, DiseaseSeverity, Location, NewScanRequest,
    PaymentStatus, Priority, RequestId, RequestStatus, ScanRequest,
};
use agrismart_pipeline::{InMemoryRepository, LifecycleConfig, ProgressSink, ScanRequestService};
use chrono::NaiveDate;
use parking_lot::Mutex;
use std::sync::Arc;

/// Paid cocoa order in the Centre region
pub fn sample_order() -> NewScanRequest {
    NewScanRequest {
        farmer_id: "FRM-001".to_string(),
        farmer_name: "Jean-Pierre Mbarga".to_string(),
        farmer_phone: "+237 6 77 12 34 56".to_string(),
        farm_name: "Mbarga Cocoa Estate".to_string(),
        location: Location {
            region: "Centre".to_string(),
            coordinates: Coordinates { lat: 3.848, lng: 11.502 },
            address: "Obala, Lekie".to_string(),
        },
        hectares: 12.5,
        crop_type: "Cocoa".to_string(),
        payment_amount: 125_000,
        payment_status: PaymentStatus::Paid,
        priority: Priority::Normal,
        notes: None,
    }
}

/// Submission date used by fixtures
pub fn request_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
}

/// [`sample_order`] submitted under `id`
pub fn pending_request(id: &str) -> ScanRequest {
    sample_order().into_request(RequestId::from(id), request_date())
}

/// A single moderate fungal finding
pub fn sample_detection() -> Detection {
    Detection {
        id: "det-test-1".to_string(),
        disease_name: "Black Pod".to_string(),
        category: DiseaseCategory::Fungal,
        severity: DiseaseSeverity::Moderate,
        confidence: 91.0,
        affected_area: 12.0,
        description: "Brown lesions on pods.".to_string(),
        treatment: "Remove infected pods.".to_string(),
    }
}

/// Checked path from `pending_approval` to `target`
pub fn path_to(target: RequestStatus) -> Vec<RequestStatus> {
    if target == RequestStatus::PendingApproval {
        return Vec::new();
    }
    if target == RequestStatus::Rejected {
        return vec![RequestStatus::Rejected];
    }
    let mut path = vec![RequestStatus::Approved];
    let mut current = RequestStatus::Approved;
    while current != target {
        current = agrismart_core::next_status(current)
            .unwrap_or_else(|| panic!("{target} not on the main path"));
        path.push(current);
    }
    path
}

/// A request walked through real transitions to `status`, with the fields
/// each step unlocks filled in
pub fn request_in(id: &str, status: RequestStatus) -> ScanRequest {
    let mut request = pending_request(id);
    for step in path_to(status) {
        request = advance(&request, step, |r| match step {
            RequestStatus::Scheduled => {
                r.scheduled_date = NaiveDate::from_ymd_opt(2024, 3, 8);
                r.assigned_operator = Some("OP-001".to_string());
            }
            RequestStatus::AwaitingAnalysis => r.drone_images = Some(24),
            RequestStatus::AnalysisComplete => {
                r.analysis_progress = Some(100);
                r.detections = Some(vec![sample_detection()]);
            }
            RequestStatus::Completed => {
                r.assigned_agronomist = Some("AGR-001".to_string());
                r.completed_date = NaiveDate::from_ymd_opt(2024, 3, 12);
                r.report_url = Some(format!("/reports/{id}.pdf"));
            }
            _ => {}
        })
        .unwrap();
    }
    request
}

/// Configuration with every delay at zero
pub fn instant_config() -> LifecycleConfig {
    LifecycleConfig::instant()
}

/// Instant service over an empty in-memory repository
pub fn setup_service() -> (ScanRequestService, Arc<InMemoryRepository>) {
    let repo = Arc::new(InMemoryRepository::new());
    let service = ScanRequestService::new(instant_config(), repo.clone());
    (service, repo)
}

/// Collects reported progress values; clones share the same buffer
#[derive(Debug, Clone, Default)]
pub struct ProgressRecorder {
    seen: Arc<Mutex<Vec<u8>>>,
}

impl ProgressRecorder {
    /// Empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Values reported so far
    pub fn values(&self) -> Vec<u8> {
        self.seen.lock().clone()
    }

    /// Panics unless progress ran from 0 to 100 without decreasing
    pub fn assert_complete(&self) {
        let values = self.values();
        assert_eq!(values.first(), Some(&0), "progress must start at 0");
        assert_eq!(values.last(), Some(&100), "progress must end at 100");
        assert!(
            values.windows(2).all(|w| w[0] <= w[1]),
            "progress must not decrease: {values:?}"
        );
    }
}

impl ProgressSink for ProgressRecorder {
    fn report(&mut self, percent: u8) {
        self.seen.lock().push(percent);
    }
}
