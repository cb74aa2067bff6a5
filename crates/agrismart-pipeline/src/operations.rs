//! Operation wrappers
//!
//! One wrapper per lifecycle action. Each one:
//! - checks the transition before doing any work, so a request in the wrong
//!   status fails without waiting or reporting progress
//! - builds its result through [`advance`], so the check runs again on the
//!   record it returns
//! - never mutates its input
//!
//! Latency comes from [`LifecycleConfig`]; the wait is where real I/O
//! (persistence, upload, inference) belongs.

use crate::analysis::{AnalysisEngine, StaticAnalysisEngine};
use crate::config::{millis, LifecycleConfig};
use crate::error::OperationError;
use crate::progress::{drive, pause, progress_steps, ProgressSink};
use agrismart_core::{advance, validate_transition, RequestStatus, ScanRequest};
use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Lifecycle operations bound to a configuration and analysis engine
#[derive(Clone)]
pub struct Operations {
    config: Arc<LifecycleConfig>,
    engine: Arc<dyn AnalysisEngine>,
}

impl std::fmt::Debug for Operations {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Operations")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Operations {
    /// Create with the static analysis engine
    #[must_use]
    pub fn new(config: LifecycleConfig) -> Self {
        Self::with_engine(config, Arc::new(StaticAnalysisEngine))
    }

    /// Create with a custom analysis engine
    #[must_use]
    pub fn with_engine(config: LifecycleConfig, engine: Arc<dyn AnalysisEngine>) -> Self {
        Self {
            config: Arc::new(config),
            engine,
        }
    }

    /// Configuration the wrappers run with
    #[inline]
    #[must_use]
    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    /// `pending_approval -> approved`
    ///
    /// # Errors
    /// `OperationError::Lifecycle` if the request is not pending approval.
    pub async fn approve_request(&self, request: &ScanRequest) -> Result<ScanRequest, OperationError> {
        self.simple(request, RequestStatus::Approved, self.config.delays.approve_ms)
            .await
    }

    /// `pending_approval -> rejected`
    ///
    /// # Errors
    /// `OperationError::Lifecycle` if the request is not pending approval.
    pub async fn reject_request(&self, request: &ScanRequest) -> Result<ScanRequest, OperationError> {
        self.simple(request, RequestStatus::Rejected, self.config.delays.reject_ms)
            .await
    }

    /// `approved -> scheduled`, booking `date` with `operator_id`
    ///
    /// # Errors
    /// `OperationError::Lifecycle` if the request is not approved.
    pub async fn schedule_request(
        &self,
        request: &ScanRequest,
        date: NaiveDate,
        operator_id: &str,
    ) -> Result<ScanRequest, OperationError> {
        validate_transition(request.status(), RequestStatus::Scheduled)?;
        sleep_ms(self.config.delays.schedule_ms).await;

        let scheduled = advance(request, RequestStatus::Scheduled, |r| {
            r.scheduled_date = Some(date);
            r.assigned_operator = Some(operator_id.to_string());
        })?;
        tracing::info!(request_id = %request.id, %date, operator_id, "scan scheduled");
        Ok(scheduled)
    }

    /// `scheduled -> in_progress`, the drone flight starts
    ///
    /// # Errors
    /// `OperationError::Lifecycle` if the request is not scheduled.
    pub async fn start_scan(&self, request: &ScanRequest) -> Result<ScanRequest, OperationError> {
        self.simple(request, RequestStatus::InProgress, self.config.delays.start_scan_ms)
            .await
    }

    /// `in_progress -> awaiting_analysis`, uploading `image_count` images
    ///
    /// Reports 0..=100 to `progress`.
    ///
    /// # Errors
    /// - `OperationError::Lifecycle` if the request is not in progress
    /// - `OperationError::Cancelled` if `cancel` fires first
    pub async fn upload_drone_images(
        &self,
        request: &ScanRequest,
        image_count: u32,
        progress: &mut dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<ScanRequest, OperationError> {
        validate_transition(request.status(), RequestStatus::AwaitingAnalysis)?;

        let settings = self.config.progress;
        let steps = progress_steps(settings.upload_step);
        if let Err(e) = drive(&steps, millis(settings.upload_step_ms), progress, cancel).await {
            tracing::warn!(request_id = %request.id, error = %e, "upload aborted");
            return Err(e);
        }

        let uploaded = advance(request, RequestStatus::AwaitingAnalysis, |r| {
            r.drone_images = Some(image_count);
        })?;
        tracing::info!(request_id = %request.id, image_count, "drone images uploaded");
        Ok(uploaded)
    }

    /// `awaiting_analysis -> analysis_complete`, attaching detections
    ///
    /// Reports 0..=100 to `progress`. The final 100 is held back until the
    /// engine has returned its detections, so a failed or cancelled analysis
    /// never reports completion.
    ///
    /// # Errors
    /// - `OperationError::Lifecycle` if the request is not awaiting analysis
    /// - `OperationError::Cancelled` if `cancel` fires first
    /// - `OperationError::Analysis` from the engine
    pub async fn run_ai_analysis(
        &self,
        request: &ScanRequest,
        progress: &mut dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<ScanRequest, OperationError> {
        validate_transition(request.status(), RequestStatus::AnalysisComplete)?;

        let settings = self.config.progress;
        let step_delay = millis(settings.analysis_step_ms);
        let mut steps = progress_steps(settings.analysis_step);
        let last = steps.pop().unwrap_or(100);

        if let Err(e) = drive(&steps, step_delay, progress, cancel).await {
            tracing::warn!(request_id = %request.id, error = %e, "analysis aborted");
            return Err(e);
        }
        pause(step_delay, cancel).await?;

        let detections = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(OperationError::Cancelled),
            found = self.engine.analyze(request) => found,
        };
        let detections = match detections {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(request_id = %request.id, error = %e, "analysis engine failed");
                return Err(e);
            }
        };
        progress.report(last);

        let count = detections.len();
        let analysed = advance(request, RequestStatus::AnalysisComplete, |r| {
            r.analysis_progress = Some(100);
            r.detections = Some(detections);
        })?;
        tracing::info!(request_id = %request.id, detections = count, "analysis complete");
        Ok(analysed)
    }

    /// `analysis_complete -> validation_required`
    ///
    /// # Errors
    /// `OperationError::Lifecycle` if analysis has not completed.
    pub async fn request_validation(&self, request: &ScanRequest) -> Result<ScanRequest, OperationError> {
        self.simple(
            request,
            RequestStatus::ValidationRequired,
            self.config.delays.request_validation_ms,
        )
        .await
    }

    /// `validation_required -> completed`, signed off by `agronomist_id`
    ///
    /// Sets the completion date (today, UTC) and the report URL.
    ///
    /// # Errors
    /// `OperationError::Lifecycle` if the request is not awaiting validation.
    pub async fn validate_results(
        &self,
        request: &ScanRequest,
        agronomist_id: &str,
    ) -> Result<ScanRequest, OperationError> {
        validate_transition(request.status(), RequestStatus::Completed)?;
        sleep_ms(self.config.delays.validate_ms).await;

        let report_url = self.config.report_url(&request.id);
        let completed = advance(request, RequestStatus::Completed, |r| {
            r.assigned_agronomist = Some(agronomist_id.to_string());
            r.completed_date = Some(Utc::now().date_naive());
            r.report_url = Some(report_url);
        })?;
        tracing::info!(request_id = %request.id, agronomist_id, "results validated");
        Ok(completed)
    }

    /// Generic status change with no unlocked fields
    ///
    /// # Errors
    /// `OperationError::Lifecycle` for any pair outside the transition graph.
    pub async fn transition_status(
        &self,
        request: &ScanRequest,
        new_status: RequestStatus,
    ) -> Result<ScanRequest, OperationError> {
        self.simple(request, new_status, self.config.delays.transition_ms)
            .await
    }

    async fn simple(
        &self,
        request: &ScanRequest,
        to: RequestStatus,
        delay_ms: u64,
    ) -> Result<ScanRequest, OperationError> {
        let from = request.status();
        validate_transition(from, to)?;
        sleep_ms(delay_ms).await;

        let next = advance(request, to, |_| {})?;
        tracing::info!(request_id = %request.id, %from, %to, "status changed");
        Ok(next)
    }
}

async fn sleep_ms(ms: u64) {
    if ms > 0 {
        tokio::time::sleep(millis(ms)).await;
    }
}
