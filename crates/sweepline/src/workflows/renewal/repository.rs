use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::domain::{CompanyId, JobId, SentJobRecord};

/// Storage abstraction over the managed job store so the scan can be
/// exercised against an in-memory substitute.
pub trait JobStore: Send + Sync {
    /// Full snapshot of jobs already delivered once and now tracked for
    /// their renewal deadline, each with its report payloads and resolved
    /// customer reference.
    fn load_sent_jobs(&self) -> Result<Vec<SentJobRecord>, StoreError>;
}

/// Error enumeration for job store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("job store unavailable: {0}")]
    Unavailable(String),
    #[error("malformed job row: {0}")]
    Malformed(String),
}

/// Append-only record of a dispatched (or attempted) notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub company_id: Option<CompanyId>,
    /// Absent for digests spanning more than one building.
    pub job_id: Option<JobId>,
    pub recipient: String,
    pub subject: String,
    /// Structured description of what the notification included.
    pub payload: Value,
    pub status: DeliveryStatus,
    pub provider_message_id: Option<String>,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Sent,
    Failed,
}

/// Filter used when probing for previously recorded notices. `None` fields
/// do not constrain the lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerQuery {
    pub recipient: Option<String>,
    pub subject: String,
    pub job_id: Option<JobId>,
    pub sent_after: Option<DateTime<Utc>>,
}

/// Append-only notification ledger; the only durable state this subsystem
/// writes.
pub trait NotificationLedger: Send + Sync {
    fn find(&self, query: &LedgerQuery) -> Result<Vec<LedgerEntry>, LedgerError>;
    fn record(&self, entry: LedgerEntry) -> Result<(), LedgerError>;
}

/// Error enumeration for ledger failures.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("notification ledger unavailable: {0}")]
    Unavailable(String),
}

/// Outbound message handed to the transactional email provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

/// Provider acknowledgement for a delivered message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailReceipt {
    pub provider_message_id: String,
}

/// Trait describing the external email transport. One call per dispatch; the
/// pipeline never retries within a run.
pub trait EmailTransport: Send + Sync {
    fn send(&self, message: &EmailMessage) -> Result<EmailReceipt, TransportError>;
}

/// Error enumeration for transport failures.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("email transport rejected message: {0}")]
    Rejected(String),
    #[error("email transport unavailable: {0}")]
    Unavailable(String),
}
