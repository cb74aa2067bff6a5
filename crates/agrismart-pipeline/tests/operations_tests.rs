//! Functional tests for the operation wrappers.
//!
//! Each wrapper must:
//! - move the request along exactly one edge of the transition graph
//! - fail with InvalidTransition, before any work, when called from the
//!   wrong status
//! - report non-decreasing progress ending at 100 (upload, analysis)
//! - stop early and return Cancelled when its token fires
//! - leave every field alone except `status` and the ones it unlocks

use agrismart_core::{Detection, RequestStatus, ScanRequest};
use agrismart_pipeline::{
    AnalysisEngine, CancellationToken, LifecycleConfig, NoProgress, OperationError, Operations,
    ProgressConfig,
};
use agrismart_test_utils::{instant_config, pending_request, request_in, ProgressRecorder};
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;
use RequestStatus::*;

/// Takes a minute per request
struct SlowEngine;

#[async_trait::async_trait]
impl AnalysisEngine for SlowEngine {
    async fn analyze(&self, _request: &ScanRequest) -> Result<Vec<Detection>, OperationError> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(Vec::new())
    }
}

fn ops() -> Operations {
    Operations::new(instant_config())
}

/// Compare the JSON forms of `before` and `after`, with `status` and the
/// `unlocked` keys taken from `after`. Unlocked keys must be set.
fn assert_only_changed(before: &ScanRequest, after: &ScanRequest, unlocked: &[&str]) {
    let actual = serde_json::to_value(after).unwrap();
    let mut expected = serde_json::to_value(before).unwrap();
    let fields = expected.as_object_mut().unwrap();
    for key in std::iter::once("status").chain(unlocked.iter().copied()) {
        let value = actual.get(key).cloned().unwrap_or(serde_json::Value::Null);
        assert!(!value.is_null(), "{key} was not set");
        fields.insert(key.to_string(), value);
    }
    assert_eq!(actual, expected);
}

fn assert_invalid(err: OperationError, from: RequestStatus, to: RequestStatus) {
    assert_eq!(err.invalid_transition(), Some((from, to)), "got {err:?}");
}

#[tokio::test]
async fn approve_and_reject_leave_pending_approval() {
    let request = pending_request("REQ-100");

    let approved = ops().approve_request(&request).await.unwrap();
    assert_eq!(approved.status(), Approved);

    let rejected = ops().reject_request(&request).await.unwrap();
    assert_eq!(rejected.status(), Rejected);

    // The input is untouched by either call.
    assert_eq!(request.status(), PendingApproval);
}

#[tokio::test]
async fn approve_twice_is_rejected() {
    let approved = request_in("REQ-101", Approved);
    let err = ops().approve_request(&approved).await.unwrap_err();
    assert_invalid(err, Approved, Approved);
}

#[tokio::test]
async fn schedule_sets_date_and_operator() {
    let approved = request_in("REQ-102", Approved);
    let date = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();

    let scheduled = ops()
        .schedule_request(&approved, date, "OP-007")
        .await
        .unwrap();

    assert_eq!(scheduled.status(), Scheduled);
    assert_eq!(scheduled.scheduled_date, Some(date));
    assert_eq!(scheduled.assigned_operator.as_deref(), Some("OP-007"));
}

#[tokio::test]
async fn schedule_from_pending_fails_closed() {
    let request = pending_request("REQ-103");
    let date = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();

    let err = ops()
        .schedule_request(&request, date, "OP-007")
        .await
        .unwrap_err();
    assert_invalid(err, PendingApproval, Scheduled);
}

#[tokio::test]
async fn upload_reports_progress_and_sets_image_count() {
    let in_progress = request_in("REQ-104", InProgress);
    let mut recorder = ProgressRecorder::new();

    let uploaded = ops()
        .upload_drone_images(&in_progress, 36, &mut recorder, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(uploaded.status(), AwaitingAnalysis);
    assert_eq!(uploaded.drone_images, Some(36));
    recorder.assert_complete();
    assert_eq!(recorder.values().len(), 11);
}

#[tokio::test]
async fn upload_from_scheduled_fails_without_progress() {
    let scheduled = request_in("REQ-105", Scheduled);
    let mut recorder = ProgressRecorder::new();

    let err = ops()
        .upload_drone_images(&scheduled, 36, &mut recorder, &CancellationToken::new())
        .await
        .unwrap_err();

    assert_invalid(err, Scheduled, AwaitingAnalysis);
    assert!(recorder.values().is_empty());
}

#[tokio::test]
async fn analysis_attaches_detections() {
    let awaiting = request_in("REQ-106", AwaitingAnalysis);
    let mut recorder = ProgressRecorder::new();

    let analysed = ops()
        .run_ai_analysis(&awaiting, &mut recorder, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(analysed.status(), AnalysisComplete);
    assert_eq!(analysed.analysis_progress, Some(100));
    let names: Vec<_> = analysed
        .detections
        .as_ref()
        .unwrap()
        .iter()
        .map(|d| d.disease_name.as_str())
        .collect();
    assert_eq!(names, vec!["Late Blight", "Nitrogen Deficiency"]);

    recorder.assert_complete();
    assert_eq!(recorder.values().len(), 21);
}

#[tokio::test]
async fn uneven_step_still_ends_at_100() {
    let config = instant_config().with_progress(ProgressConfig {
        analysis_step: 30,
        ..instant_config().progress
    });
    let awaiting = request_in("REQ-107", AwaitingAnalysis);
    let mut recorder = ProgressRecorder::new();

    Operations::new(config)
        .run_ai_analysis(&awaiting, &mut recorder, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(recorder.values(), vec![0, 30, 60, 90, 100]);
}

#[tokio::test]
async fn validation_completes_with_report() {
    let needs_validation = request_in("REQ-108", ValidationRequired);

    let completed = ops()
        .validate_results(&needs_validation, "AGR-004")
        .await
        .unwrap();

    assert_eq!(completed.status(), Completed);
    assert_eq!(completed.assigned_agronomist.as_deref(), Some("AGR-004"));
    assert_eq!(completed.report_url.as_deref(), Some("/reports/REQ-108.pdf"));
    assert!(completed.completed_date.is_some());
}

#[tokio::test]
async fn validation_straight_after_analysis_fails() {
    let analysed = request_in("REQ-109", AnalysisComplete);
    let err = ops().validate_results(&analysed, "AGR-004").await.unwrap_err();
    assert_invalid(err, AnalysisComplete, Completed);

    let pending = ops().request_validation(&analysed).await.unwrap();
    assert_eq!(pending.status(), ValidationRequired);
}

#[tokio::test]
async fn full_pipeline_through_wrappers() {
    let ops = ops();
    let cancel = CancellationToken::new();
    let date = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();

    let r: ScanRequest = pending_request("REQ-110");
    let r = ops.approve_request(&r).await.unwrap();
    let r = ops.schedule_request(&r, date, "OP-001").await.unwrap();
    let r = ops.start_scan(&r).await.unwrap();
    let r = ops
        .upload_drone_images(&r, 12, &mut NoProgress, &cancel)
        .await
        .unwrap();
    let r = ops.run_ai_analysis(&r, &mut NoProgress, &cancel).await.unwrap();
    let r = ops.request_validation(&r).await.unwrap();
    let r = ops.validate_results(&r, "AGR-001").await.unwrap();

    assert_eq!(r.status(), Completed);
    assert_eq!(r.drone_images, Some(12));
    assert_eq!(r.detection_count(), 2);
}

#[tokio::test]
async fn generic_transition_follows_graph() {
    let analysed = request_in("REQ-111", AnalysisComplete);

    let next = ops()
        .transition_status(&analysed, ValidationRequired)
        .await
        .unwrap();
    assert_eq!(next.status(), ValidationRequired);
    assert_eq!(next.detections, analysed.detections);

    let err = ops().transition_status(&analysed, Completed).await.unwrap_err();
    assert_invalid(err, AnalysisComplete, Completed);
}

#[tokio::test]
async fn wrappers_touch_only_unlocked_fields() {
    let ops = ops();
    let cancel = CancellationToken::new();
    let date = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();

    let pending = pending_request("REQ-115");
    let approved = ops.approve_request(&pending).await.unwrap();
    assert_only_changed(&pending, &approved, &[]);

    let rejected = ops.reject_request(&pending).await.unwrap();
    assert_only_changed(&pending, &rejected, &[]);

    let scheduled = ops.schedule_request(&approved, date, "OP-003").await.unwrap();
    assert_only_changed(&approved, &scheduled, &["scheduledDate", "assignedOperator"]);

    let started = ops.start_scan(&scheduled).await.unwrap();
    assert_only_changed(&scheduled, &started, &[]);

    let uploaded = ops
        .upload_drone_images(&started, 48, &mut NoProgress, &cancel)
        .await
        .unwrap();
    assert_only_changed(&started, &uploaded, &["droneImages"]);

    let analysed = ops
        .run_ai_analysis(&uploaded, &mut NoProgress, &cancel)
        .await
        .unwrap();
    assert_only_changed(&uploaded, &analysed, &["analysisProgress", "detections"]);

    let needs_validation = ops.request_validation(&analysed).await.unwrap();
    assert_only_changed(&analysed, &needs_validation, &[]);

    let completed = ops
        .validate_results(&needs_validation, "AGR-005")
        .await
        .unwrap();
    assert_only_changed(
        &needs_validation,
        &completed,
        &["assignedAgronomist", "completedDate", "reportUrl"],
    );
}

#[tokio::test]
async fn pre_cancelled_upload_reports_nothing() {
    let in_progress = request_in("REQ-112", InProgress);
    let cancel = CancellationToken::new();
    cancel.cancel();
    let mut recorder = ProgressRecorder::new();

    let err = ops()
        .upload_drone_images(&in_progress, 36, &mut recorder, &cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, OperationError::Cancelled));
    assert!(recorder.values().is_empty());
}

#[tokio::test(start_paused = true)]
async fn cancel_mid_analysis_stops_progress() {
    let config = LifecycleConfig::default();
    let step_ms = config.progress.analysis_step_ms;
    let ops = Operations::new(config);
    let awaiting = request_in("REQ-113", AwaitingAnalysis);
    let cancel = CancellationToken::new();

    let canceller = cancel.clone();
    tokio::spawn(async move {
        // Between the third and fourth report.
        tokio::time::sleep(Duration::from_millis(step_ms * 3 + step_ms / 2)).await;
        canceller.cancel();
    });

    let mut recorder = ProgressRecorder::new();
    let err = ops
        .run_ai_analysis(&awaiting, &mut recorder, &cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, OperationError::Cancelled));
    assert_eq!(recorder.values(), vec![0, 5, 10]);
}

#[tokio::test(start_paused = true)]
async fn default_upload_takes_simulated_time() {
    let ops = Operations::new(LifecycleConfig::default());
    let in_progress = request_in("REQ-114", InProgress);
    let start = tokio::time::Instant::now();

    ops.upload_drone_images(&in_progress, 10, &mut NoProgress, &CancellationToken::new())
        .await
        .unwrap();

    // 11 steps of 300ms each.
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(3300), "{elapsed:?}");
    assert!(elapsed < Duration::from_millis(3400), "{elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn cancel_during_inference_withholds_completion() {
    let ops = Operations::with_engine(instant_config(), Arc::new(SlowEngine));
    let awaiting = request_in("REQ-116", AwaitingAnalysis);
    let cancel = CancellationToken::new();

    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        canceller.cancel();
    });

    let mut recorder = ProgressRecorder::new();
    let err = ops
        .run_ai_analysis(&awaiting, &mut recorder, &cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, OperationError::Cancelled));
    assert_eq!(recorder.values().last(), Some(&95));
}
