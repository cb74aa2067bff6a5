//! AgriSmart Core - scan-request lifecycle
//!
//! The lifecycle of a drone-scan order:
//! - `RequestStatus`: the closed set of lifecycle stages
//! - the static transition graph between them
//! - checked transitions that produce new `ScanRequest` records
//! - status labels and badge colors for display
//!
//! Everything here is pure. Async operations, persistence and the activity
//! log live in `agrismart-pipeline`.
//!
//! # Example
//!
//! ```rust
//! use agrismart_core::prelude::*;
//!
//! # fn example(request: ScanRequest) -> Result<(), LifecycleError> {
//! assert!(can_transition(RequestStatus::PendingApproval, RequestStatus::Approved));
//!
//! let approved = transition_status(&request, RequestStatus::Approved)?;
//! assert_eq!(approved.status(), RequestStatus::Approved);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod error;
pub mod lifecycle;
pub mod presentation;
pub mod state_machine;
pub mod types;

pub use error::{GraphError, LifecycleError, ParseStatusError};
pub use lifecycle::{advance, transition_status};
pub use presentation::{format_currency, status_color, status_label, StatusColor};
pub use state_machine::graph::{verify_graph, GraphReport};
pub use state_machine::{can_transition, next_status, validate_transition, RequestStatus};
pub use types::{
    Coordinates, Detection, DiseaseCategory, DiseaseSeverity, Location, NewScanRequest,
    PaymentStatus, Priority, RequestId, ScanRequest,
};

/// Common imports for working with the lifecycle
pub mod prelude {
    pub use crate::{
        can_transition, next_status, transition_status, LifecycleError, RequestId,
        RequestStatus, ScanRequest, StatusColor,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
