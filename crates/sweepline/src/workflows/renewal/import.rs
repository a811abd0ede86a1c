use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

use super::domain::{
    CompanyId, CustomerId, CustomerRef, JobId, JobKind, JobStatus, ReportPayload, SentJobRecord,
};

#[derive(Debug)]
pub enum SnapshotImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    Row { job_id: String, message: String },
}

impl std::fmt::Display for SnapshotImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnapshotImportError::Io(err) => write!(f, "failed to read jobs export: {}", err),
            SnapshotImportError::Csv(err) => write!(f, "invalid jobs CSV data: {}", err),
            SnapshotImportError::Row { job_id, message } => {
                write!(f, "invalid row for job '{}': {}", job_id, message)
            }
        }
    }
}

impl std::error::Error for SnapshotImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SnapshotImportError::Io(err) => Some(err),
            SnapshotImportError::Csv(err) => Some(err),
            SnapshotImportError::Row { .. } => None,
        }
    }
}

impl From<std::io::Error> for SnapshotImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for SnapshotImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Builds an in-memory job snapshot from a CSV export of the jobs table, one
/// row per report. Rows that never reached `sent` are skipped; rows sharing a
/// job id fold into one record with multiple report payloads.
///
/// Used by the offline scan command so operators can dry-run the pipeline
/// against an export without touching the managed store.
pub struct SnapshotCsvImporter;

impl SnapshotCsvImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<SentJobRecord>, SnapshotImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<SentJobRecord>, SnapshotImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut jobs: Vec<SentJobRecord> = Vec::new();
        let mut by_job: HashMap<String, usize> = HashMap::new();

        for record in csv_reader.deserialize::<SnapshotRow>() {
            let row = record?;

            let status = parse_status(&row.status).ok_or_else(|| SnapshotImportError::Row {
                job_id: row.job_id.clone(),
                message: format!("unknown status '{}'", row.status),
            })?;
            if status != JobStatus::Sent {
                continue;
            }

            let kind = parse_kind(&row.kind).ok_or_else(|| SnapshotImportError::Row {
                job_id: row.job_id.clone(),
                message: format!("unknown job kind '{}'", row.kind),
            })?;

            let inspection_date =
                parse_date(&row.inspection_date).ok_or_else(|| SnapshotImportError::Row {
                    job_id: row.job_id.clone(),
                    message: format!("invalid inspection_date '{}'", row.inspection_date),
                })?;

            let next_inspection_date = match row.next_inspection_date.as_deref() {
                Some(raw) => Some(parse_date(raw).ok_or_else(|| SnapshotImportError::Row {
                    job_id: row.job_id.clone(),
                    message: format!("invalid next_inspection_date '{raw}'"),
                })?),
                None => None,
            };

            let payload = ReportPayload {
                customer_name: row.customer_name.clone(),
                contact_email: row.contact_email.clone(),
                unit_label: row.unit_label.clone(),
                next_inspection_date,
                ..ReportPayload::default()
            };

            match by_job.get(&row.job_id) {
                Some(&slot) => jobs[slot].reports.push(payload),
                None => {
                    let customer = row.customer_id.as_ref().map(|id| CustomerRef {
                        id: CustomerId(id.clone()),
                        name: row.customer_name.clone().unwrap_or_default(),
                        email: row.customer_email.clone().unwrap_or_default(),
                    });

                    by_job.insert(row.job_id.clone(), jobs.len());
                    jobs.push(SentJobRecord {
                        job_id: JobId(row.job_id.clone()),
                        kind,
                        company_id: CompanyId(row.company_id.unwrap_or_default()),
                        customer,
                        inspection_address: row.inspection_address.clone(),
                        inspection_date,
                        technician_name: row.technician.clone(),
                        reports: vec![payload],
                    });
                }
            }
        }

        Ok(jobs)
    }
}

#[derive(Debug, Deserialize)]
struct SnapshotRow {
    job_id: String,
    kind: String,
    status: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    company_id: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    customer_id: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    customer_name: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    customer_email: Option<String>,
    inspection_address: String,
    inspection_date: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    technician: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    unit_label: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    contact_email: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    next_inspection_date: Option<String>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

fn parse_kind(value: &str) -> Option<JobKind> {
    match value.trim().to_ascii_lowercase().as_str() {
        "single_inspection" | "inspection" => Some(JobKind::SingleInspection),
        "passport" => Some(JobKind::Passport),
        _ => None,
    }
}

fn parse_status(value: &str) -> Option<JobStatus> {
    match value.trim().to_ascii_lowercase().as_str() {
        "draft" => Some(JobStatus::Draft),
        "in_progress" => Some(JobStatus::InProgress),
        "completed" => Some(JobStatus::Completed),
        "sent" => Some(JobStatus::Sent),
        _ => None,
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}
