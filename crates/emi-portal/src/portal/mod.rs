//! Application lifecycle, audit trail, and portal views.
//!
//! Every mutation flows through [`service::PortalService`], which pairs each
//! effective change with exactly one [`activity::ActivityLogEntry`] and keeps
//! per-application status history strictly append-only. Storage is behind the
//! traits in [`repository`] so the service can run against the in-memory
//! backends used by the API binary and the tests alike.

pub mod activity;
pub mod domain;
pub mod lifecycle;
pub mod report;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use activity::{ActivityKind, ActivityLogEntry, LogId, RecorderError};
pub use domain::{
    Application, ApplicationDraft, ApplicationId, ApplicationStatus, ApplicationView, DraftError,
    MerchantContext, StatusHistoryEntry, Store, StoreDraft, StoreStatus,
};
pub use lifecycle::{ApplicationPatch, FieldDelta, LifecycleError, LifecyclePolicy};
pub use report::{PortalSummary, ReportError, StatusCountEntry, StorePerformanceEntry};
pub use repository::{ActivityLogStore, ApplicationRepository, RepositoryError, StoreDirectory};
pub use router::portal_router;
pub use service::{EditOutcome, PortalService, PortalServiceError};
