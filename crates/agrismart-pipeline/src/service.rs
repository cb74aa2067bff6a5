//! Scan request service
//!
//! Binds operations to a repository and activity log. Every method loads the
//! request by id, runs the operation wrapper, persists the new record and
//! logs the event. A failed or cancelled operation persists nothing.
//!
//! Actions on one request id are serialised: the per-id lock is held from
//! load to save, so the transition is always checked against the stored
//! status. The save itself is conditional on the status that was loaded,
//! which catches writers outside this service sharing the repository.

use crate::analysis::AnalysisEngine;
use crate::config::LifecycleConfig;
use crate::error::OperationError;
use crate::logging::{Activity, ActivityLog};
use crate::operations::Operations;
use crate::progress::ProgressSink;
use crate::error::RepositoryError;
use crate::repository::{RequestFilter, RequestRepository};
use agrismart_core::{
    format_currency, LifecycleError, NewScanRequest, RequestId, RequestStatus, ScanRequest,
};
use chrono::NaiveDate;
use dashmap::DashMap;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio_util::sync::CancellationToken;

/// Dashboard counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineSummary {
    /// All stored requests
    pub total: usize,
    /// Waiting for an approve or reject decision
    pub pending_approvals: usize,
    /// Booked but not flown
    pub scheduled: usize,
    /// Flown but not yet completed
    pub in_flight: usize,
    /// Validated with a report
    pub completed: usize,
    /// Declined
    pub rejected: usize,
    /// Count per status; statuses with no requests are absent
    pub by_status: BTreeMap<RequestStatus, usize>,
}

impl PipelineSummary {
    fn from_requests(requests: &[ScanRequest]) -> Self {
        let mut by_status = BTreeMap::new();
        for request in requests {
            *by_status.entry(request.status()).or_insert(0) += 1;
        }
        let count = |s: RequestStatus| by_status.get(&s).copied().unwrap_or(0);

        Self {
            total: requests.len(),
            pending_approvals: count(RequestStatus::PendingApproval),
            scheduled: count(RequestStatus::Scheduled),
            in_flight: count(RequestStatus::InProgress)
                + count(RequestStatus::AwaitingAnalysis)
                + count(RequestStatus::AnalysisComplete)
                + count(RequestStatus::ValidationRequired),
            completed: count(RequestStatus::Completed),
            rejected: count(RequestStatus::Rejected),
            by_status,
        }
    }
}

/// Lifecycle service over a repository
pub struct ScanRequestService {
    operations: Operations,
    repository: Arc<dyn RequestRepository>,
    activity: ActivityLog,
    locks: DashMap<RequestId, Arc<Mutex<()>>>,
}

impl std::fmt::Debug for ScanRequestService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanRequestService")
            .field("operations", &self.operations)
            .field("activity_entries", &self.activity.len())
            .finish_non_exhaustive()
    }
}

impl ScanRequestService {
    /// Service with the static analysis engine
    #[must_use]
    pub fn new(config: LifecycleConfig, repository: Arc<dyn RequestRepository>) -> Self {
        Self::with_operations(Operations::new(config), repository)
    }

    /// Service with a custom analysis engine
    #[must_use]
    pub fn with_engine(
        config: LifecycleConfig,
        repository: Arc<dyn RequestRepository>,
        engine: Arc<dyn AnalysisEngine>,
    ) -> Self {
        Self::with_operations(Operations::with_engine(config, engine), repository)
    }

    /// Service over prebuilt operations
    #[must_use]
    pub fn with_operations(operations: Operations, repository: Arc<dyn RequestRepository>) -> Self {
        Self {
            operations,
            repository,
            activity: ActivityLog::default(),
            locks: DashMap::new(),
        }
    }

    /// Wrappers this service runs
    #[inline]
    #[must_use]
    pub fn operations(&self) -> &Operations {
        &self.operations
    }

    /// Activity feed of committed actions
    #[inline]
    #[must_use]
    pub fn activity(&self) -> &ActivityLog {
        &self.activity
    }

    /// Register a new order in `PendingApproval`
    ///
    /// # Errors
    /// `OperationError::Repository` if the generated id collides.
    pub async fn submit(&self, order: NewScanRequest) -> Result<ScanRequest, OperationError> {
        let request = order.submit();
        self.repository.insert(request.clone()).await?;

        let amount = format_currency(request.payment_amount, &self.operations.config().currency_code);
        self.record(
            &request,
            format!(
                "New scan request from {} for {} ({} ha, {amount})",
                request.farmer_name, request.farm_name, request.hectares
            ),
        );
        tracing::info!(request_id = %request.id, "scan request submitted");
        Ok(request)
    }

    /// # Errors
    /// `NotFound`, or `Lifecycle` if not pending approval.
    pub async fn approve(&self, id: &RequestId) -> Result<ScanRequest, OperationError> {
        let _guard = self.lock(id).await;
        let request = self.load(id).await?;
        let approved = self.operations.approve_request(&request).await?;
        self.commit(&request, approved, format!("Request {id} approved")).await
    }

    /// # Errors
    /// `NotFound`, or `Lifecycle` if not pending approval.
    pub async fn reject(&self, id: &RequestId) -> Result<ScanRequest, OperationError> {
        let _guard = self.lock(id).await;
        let request = self.load(id).await?;
        let rejected = self.operations.reject_request(&request).await?;
        self.commit(&request, rejected, format!("Request {id} rejected")).await
    }

    /// # Errors
    /// `NotFound`, or `Lifecycle` if not approved.
    pub async fn schedule(
        &self,
        id: &RequestId,
        date: NaiveDate,
        operator_id: &str,
    ) -> Result<ScanRequest, OperationError> {
        let _guard = self.lock(id).await;
        let request = self.load(id).await?;
        let scheduled = self.operations.schedule_request(&request, date, operator_id).await?;
        self.commit(
            &request,
            scheduled,
            format!("Scan for {id} scheduled on {date} with operator {operator_id}"),
        )
        .await
    }

    /// # Errors
    /// `NotFound`, or `Lifecycle` if not scheduled.
    pub async fn start_scan(&self, id: &RequestId) -> Result<ScanRequest, OperationError> {
        let _guard = self.lock(id).await;
        let request = self.load(id).await?;
        let started = self.operations.start_scan(&request).await?;
        self.commit(&request, started, format!("Drone flight started for {id}")).await
    }

    /// # Errors
    /// `NotFound`, `Lifecycle` if not in progress, or `Cancelled`.
    pub async fn upload_images(
        &self,
        id: &RequestId,
        image_count: u32,
        progress: &mut dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<ScanRequest, OperationError> {
        let _guard = self.lock(id).await;
        let request = self.load(id).await?;
        let uploaded = self
            .operations
            .upload_drone_images(&request, image_count, progress, cancel)
            .await?;
        self.commit(&request, uploaded, format!("{image_count} drone images uploaded for {id}"))
            .await
    }

    /// # Errors
    /// `NotFound`, `Lifecycle` if not awaiting analysis, `Cancelled`, or
    /// `Analysis`.
    pub async fn run_analysis(
        &self,
        id: &RequestId,
        progress: &mut dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<ScanRequest, OperationError> {
        let _guard = self.lock(id).await;
        let request = self.load(id).await?;
        let analysed = self.operations.run_ai_analysis(&request, progress, cancel).await?;
        let message = format!(
            "Analysis complete for {id}: {} detections",
            analysed.detection_count()
        );
        self.commit(&request, analysed, message).await
    }

    /// # Errors
    /// `NotFound`, or `Lifecycle` if analysis has not completed.
    pub async fn request_validation(&self, id: &RequestId) -> Result<ScanRequest, OperationError> {
        let _guard = self.lock(id).await;
        let request = self.load(id).await?;
        let pending = self.operations.request_validation(&request).await?;
        self.commit(&request, pending, format!("Results for {id} sent for validation"))
            .await
    }

    /// # Errors
    /// `NotFound`, or `Lifecycle` if not awaiting validation.
    pub async fn validate(
        &self,
        id: &RequestId,
        agronomist_id: &str,
    ) -> Result<ScanRequest, OperationError> {
        let _guard = self.lock(id).await;
        let request = self.load(id).await?;
        let completed = self.operations.validate_results(&request, agronomist_id).await?;
        self.commit(
            &request,
            completed,
            format!("Results for {id} validated by {agronomist_id}; report ready"),
        )
        .await
    }

    /// Generic checked transition
    ///
    /// # Errors
    /// `NotFound`, or `Lifecycle` for any pair outside the graph.
    pub async fn transition(
        &self,
        id: &RequestId,
        new_status: RequestStatus,
    ) -> Result<ScanRequest, OperationError> {
        let _guard = self.lock(id).await;
        let request = self.load(id).await?;
        let next = self.operations.transition_status(&request, new_status).await?;
        self.commit(&request, next, format!("Request {id} moved to {}", new_status.label()))
            .await
    }

    /// # Errors
    /// `OperationError::NotFound` if absent.
    pub async fn get(&self, id: &RequestId) -> Result<ScanRequest, OperationError> {
        self.load(id).await
    }

    /// # Errors
    /// Repository failures.
    pub async fn list(&self, filter: &RequestFilter) -> Result<Vec<ScanRequest>, OperationError> {
        Ok(self.repository.list(filter).await?)
    }

    /// # Errors
    /// Repository failures.
    pub async fn summary(&self) -> Result<PipelineSummary, OperationError> {
        let requests = self.repository.list(&RequestFilter::all()).await?;
        Ok(PipelineSummary::from_requests(&requests))
    }

    async fn load(&self, id: &RequestId) -> Result<ScanRequest, OperationError> {
        self.repository
            .get(id)
            .await?
            .ok_or_else(|| OperationError::NotFound(id.clone()))
    }

    async fn lock(&self, id: &RequestId) -> OwnedMutexGuard<()> {
        let slot = Arc::clone(self.locks.entry(id.clone()).or_default().value());
        slot.lock_owned().await
    }

    async fn commit(
        &self,
        loaded: &ScanRequest,
        request: ScanRequest,
        message: String,
    ) -> Result<ScanRequest, OperationError> {
        match self.repository.save(request.clone(), loaded.status()).await {
            Ok(()) => {}
            Err(RepositoryError::StatusConflict { id, stored, .. }) => {
                tracing::warn!(request_id = %id, %stored, to = %request.status(), "stale write refused");
                return Err(LifecycleError::InvalidTransition {
                    from: stored,
                    to: request.status(),
                }
                .into());
            }
            Err(e) => return Err(e.into()),
        }
        self.record(&request, message);
        Ok(request)
    }

    fn record(&self, request: &ScanRequest, message: String) {
        self.activity
            .append(Activity::new(request.id.clone(), request.status(), message));
    }
}
