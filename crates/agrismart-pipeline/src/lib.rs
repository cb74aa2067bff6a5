//! AgriSmart Pipeline - scan request operations
//!
//! Drives requests through the lifecycle defined in `agrismart-core`:
//! - operation wrappers with simulated latency, progress and cancellation
//! - a repository seam with an in-memory implementation
//! - an analysis engine seam
//! - a hash-chained activity feed
//!
//! # Example
//!
//! ```rust,ignore
//! use agrismart_pipeline::prelude::*;
//! use std::sync::Arc;
//!
//! let repo = Arc::new(InMemoryRepository::new());
//! let service = ScanRequestService::new(LifecycleConfig::instant(), repo);
//!
//! let request = service.submit(order).await?;
//! let approved = service.approve(&request.id).await?;
//! ```

#![warn(unreachable_pub)]

pub mod analysis;
pub mod config;
pub mod error;
pub mod logging;
pub mod operations;
pub mod progress;
pub mod repository;
pub mod service;

pub use analysis::{AnalysisEngine, StaticAnalysisEngine};
pub use config::{LifecycleConfig, OperationDelays, ProgressConfig};
pub use error::{ConfigError, LogError, OperationError, RepositoryError};
pub use logging::{Activity, ActivityId, ActivityKind, ActivityLog};
pub use operations::Operations;
pub use progress::{progress_steps, NoProgress, ProgressSink};
pub use repository::{InMemoryRepository, RequestFilter, RequestRepository};
pub use service::{PipelineSummary, ScanRequestService};

/// Re-exported so callers need not depend on tokio-util directly
pub use tokio_util::sync::CancellationToken;

/// Common imports for driving requests
pub mod prelude {
    pub use crate::{
        CancellationToken, InMemoryRepository, LifecycleConfig, NoProgress, OperationError,
        Operations, RequestFilter, RequestRepository, ScanRequestService,
    };
    pub use agrismart_core::prelude::*;
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
