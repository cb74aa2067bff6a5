//! Scan request storage
//!
//! [`RequestRepository`] is the persistence seam. [`InMemoryRepository`]
//! backs tests and the CLI.

use crate::error::RepositoryError;
use agrismart_core::{RequestId, RequestStatus, ScanRequest};
use dashmap::DashMap;

/// Status and free-text filter over stored requests
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestFilter {
    /// Only this status, if set
    pub status: Option<RequestStatus>,
    /// Case-insensitive substring over farmer, farm, id, crop and region
    pub query: Option<String>,
}

impl RequestFilter {
    /// Matches everything
    #[inline]
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Restrict to one status
    #[inline]
    #[must_use]
    pub fn with_status(mut self, status: RequestStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Restrict to requests whose text fields contain `query`
    #[inline]
    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Whether `request` passes the filter
    #[must_use]
    pub fn matches(&self, request: &ScanRequest) -> bool {
        if self.status.is_some_and(|s| s != request.status()) {
            return false;
        }

        let Some(query) = self.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) else {
            return true;
        };
        let q = query.to_lowercase();
        [
            request.farmer_name.as_str(),
            request.farm_name.as_str(),
            request.id.as_str(),
            request.crop_type.as_str(),
            request.location.region.as_str(),
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&q))
    }
}

/// Storage for scan requests
#[async_trait::async_trait]
pub trait RequestRepository: Send + Sync {
    /// Store a new request
    ///
    /// # Errors
    /// `RepositoryError::Duplicate` if the id is taken.
    async fn insert(&self, request: ScanRequest) -> Result<(), RepositoryError>;

    /// Fetch by id
    ///
    /// # Errors
    /// Backend failures.
    async fn get(&self, id: &RequestId) -> Result<Option<ScanRequest>, RepositoryError>;

    /// Replace an existing request, provided the stored copy is still in
    /// `expected` status
    ///
    /// The status check and the write happen atomically.
    ///
    /// # Errors
    /// - `RepositoryError::NotFound` if the id is not stored
    /// - `RepositoryError::StatusConflict` if the stored status moved on
    async fn save(&self, request: ScanRequest, expected: RequestStatus) -> Result<(), RepositoryError>;

    /// Requests passing `filter`, ordered by id
    ///
    /// # Errors
    /// Backend failures.
    async fn list(&self, filter: &RequestFilter) -> Result<Vec<ScanRequest>, RepositoryError>;
}

/// Process-local repository
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    requests: DashMap<RequestId, ScanRequest>,
}

impl InMemoryRepository {
    /// Empty repository
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populated repository
    ///
    /// # Errors
    /// `RepositoryError::Duplicate` on repeated ids.
    pub fn with_requests(
        requests: impl IntoIterator<Item = ScanRequest>,
    ) -> Result<Self, RepositoryError> {
        let repo = Self::new();
        for request in requests {
            repo.insert_sync(request)?;
        }
        Ok(repo)
    }

    /// Number of stored requests
    #[must_use]
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    /// Whether nothing is stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    fn insert_sync(&self, request: ScanRequest) -> Result<(), RepositoryError> {
        match self.requests.entry(request.id.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(RepositoryError::Duplicate(request.id))
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(request);
                Ok(())
            }
        }
    }
}

#[async_trait::async_trait]
impl RequestRepository for InMemoryRepository {
    async fn insert(&self, request: ScanRequest) -> Result<(), RepositoryError> {
        self.insert_sync(request)
    }

    async fn get(&self, id: &RequestId) -> Result<Option<ScanRequest>, RepositoryError> {
        Ok(self.requests.get(id).map(|entry| entry.value().clone()))
    }

    async fn save(&self, request: ScanRequest, expected: RequestStatus) -> Result<(), RepositoryError> {
        let Some(mut entry) = self.requests.get_mut(&request.id) else {
            return Err(RepositoryError::NotFound(request.id));
        };
        let stored = entry.status();
        if stored != expected {
            return Err(RepositoryError::StatusConflict {
                id: request.id,
                expected,
                stored,
            });
        }
        *entry = request;
        Ok(())
    }

    async fn list(&self, filter: &RequestFilter) -> Result<Vec<ScanRequest>, RepositoryError> {
        let mut matching: Vec<ScanRequest> = self
            .requests
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        matching.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(matching)
    }
}
