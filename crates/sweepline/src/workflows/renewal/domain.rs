use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identifier wrapper for jobs tracked by the renewal pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub String);

/// Identifier wrapper for the customer owning one or more jobs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CustomerId(pub String);

/// Identifier wrapper for the company a job belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompanyId(pub String);

/// Closed set of job shapes the pipeline understands.
///
/// A passport covers every unit inside one building, each with its own
/// report; a single inspection carries exactly one report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    SingleInspection,
    Passport,
}

impl JobKind {
    pub const fn label(self) -> &'static str {
        match self {
            JobKind::SingleInspection => "single_inspection",
            JobKind::Passport => "passport",
        }
    }
}

/// Lifecycle status of a job. The pipeline only ever reads jobs that reached
/// `Sent` (documents delivered once, now tracked for their renewal deadline).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Draft,
    InProgress,
    Completed,
    Sent,
}

impl JobStatus {
    pub const fn label(self) -> &'static str {
        match self {
            JobStatus::Draft => "draft",
            JobStatus::InProgress => "in_progress",
            JobStatus::Completed => "completed",
            JobStatus::Sent => "sent",
        }
    }
}

/// Customer reference resolved by the loader. Addressing only; the pipeline
/// never mutates customer records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRef {
    pub id: CustomerId,
    pub name: String,
    pub email: String,
}

/// One completed inspection record attached to a job. Immutable once read;
/// passports carry one payload per physical unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportPayload {
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub unit_label: Option<String>,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub defects: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    /// Explicit next-inspection date recorded by the technician. When absent
    /// the deadline defaults to one calendar year after the inspection.
    #[serde(default)]
    pub next_inspection_date: Option<NaiveDate>,
}

/// Loader row for a job whose documents have already been delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentJobRecord {
    pub job_id: JobId,
    pub kind: JobKind,
    pub company_id: CompanyId,
    #[serde(default)]
    pub customer: Option<CustomerRef>,
    pub inspection_address: String,
    pub inspection_date: NaiveDate,
    #[serde(default)]
    pub technician_name: Option<String>,
    #[serde(default)]
    pub reports: Vec<ReportPayload>,
}

/// Derived proximity of a job or unit to its re-inspection deadline.
/// Computed on every run, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpirationStatus {
    Active,
    ExpiringSoon,
    Expired,
}

impl ExpirationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ExpirationStatus::Active => "active",
            ExpirationStatus::ExpiringSoon => "expiring_soon",
            ExpirationStatus::Expired => "expired",
        }
    }
}
