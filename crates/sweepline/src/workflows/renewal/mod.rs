//! Renewal-notification pipeline.
//!
//! A periodically triggered batch scan over every delivered job: compute the
//! re-inspection deadline per report, keep the entities sitting exactly at
//! the notice lead time, deduplicate against the notification ledger, and
//! dispatch single notices or per-customer passport digests. Per-entity
//! failures are collected into the run summary; only a failed snapshot load
//! aborts a run.

pub mod deadline;
mod dispatch;
pub mod domain;
mod guard;
mod import;
mod notice;
pub mod repository;
pub mod router;
pub mod service;
pub mod snapshot;

#[cfg(test)]
mod tests;

pub use deadline::{classify, days_remaining, renewal_deadline, NOTICE_LEAD_DAYS};
pub use dispatch::{DispatchOutcome, NoticeDispatcher};
pub use domain::{
    CompanyId, CustomerId, CustomerRef, ExpirationStatus, JobId, JobKind, JobStatus,
    ReportPayload, SentJobRecord,
};
pub use guard::{already_notified_digest, already_notified_single, DIGEST_WINDOW_HOURS};
pub use import::{SnapshotCsvImporter, SnapshotImportError};
pub use notice::{render_digest, render_single_notice, single_notice_subject, DIGEST_SUBJECT};
pub use repository::{
    DeliveryStatus, EmailMessage, EmailReceipt, EmailTransport, JobStore, LedgerEntry,
    LedgerError, LedgerQuery, NotificationLedger, StoreError, TransportError,
};
pub use router::renewal_router;
pub use service::{RenewalRunError, RenewalScanService, RunSummary, SentNotice};
pub use snapshot::{
    build_scan_plan, CustomerDigest, EntityError, EntityRef, ExpirationOverview, ExpiringBuilding,
    ExpiringUnit, ScanPlan, SingleCandidate,
};
