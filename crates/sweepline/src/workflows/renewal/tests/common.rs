use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

use crate::workflows::renewal::domain::{
    CompanyId, CustomerId, CustomerRef, JobId, JobKind, ReportPayload, SentJobRecord,
};
use crate::workflows::renewal::repository::{
    EmailMessage, EmailReceipt, EmailTransport, JobStore, LedgerEntry, LedgerError, LedgerQuery,
    NotificationLedger, StoreError, TransportError,
};
use crate::workflows::renewal::service::RenewalScanService;

pub(super) const SENDER: &str = "info@sweepline.cz";

pub(super) fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 4, 17, 6, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn today() -> NaiveDate {
    fixed_now().date_naive()
}

pub(super) fn customer(id: &str, name: &str, email: &str) -> CustomerRef {
    CustomerRef {
        id: CustomerId(id.to_string()),
        name: name.to_string(),
        email: email.to_string(),
    }
}

/// Single-inspection job whose deadline sits `days` calendar days out from
/// the fixed test clock.
pub(super) fn single_job_due_in(id: &str, recipient: &str, days: i64) -> SentJobRecord {
    single_job_due_in_on(today(), id, recipient, days)
}

/// Same, anchored to an explicit base date. Router tests anchor to the real
/// clock because the trigger endpoint evaluates wall time.
pub(super) fn single_job_due_in_on(
    base: NaiveDate,
    id: &str,
    recipient: &str,
    days: i64,
) -> SentJobRecord {
    SentJobRecord {
        job_id: JobId(id.to_string()),
        kind: JobKind::SingleInspection,
        company_id: CompanyId("co-1".to_string()),
        customer: Some(customer(&format!("cust-{id}"), "Jana Svobodova", recipient)),
        inspection_address: format!("Hlavni {id}"),
        inspection_date: base - Duration::days(300),
        technician_name: Some("Karel Novak".to_string()),
        reports: vec![ReportPayload {
            next_inspection_date: Some(base + Duration::days(days)),
            ..ReportPayload::default()
        }],
    }
}

pub(super) fn passport_unit(label: &str, due_in_days: i64) -> ReportPayload {
    ReportPayload {
        unit_label: Some(label.to_string()),
        next_inspection_date: Some(today() + Duration::days(due_in_days)),
        ..ReportPayload::default()
    }
}

pub(super) fn passport_job(
    id: &str,
    address: &str,
    owner: CustomerRef,
    units: Vec<ReportPayload>,
) -> SentJobRecord {
    SentJobRecord {
        job_id: JobId(id.to_string()),
        kind: JobKind::Passport,
        company_id: CompanyId("co-1".to_string()),
        customer: Some(owner),
        inspection_address: address.to_string(),
        inspection_date: today() - Duration::days(300),
        technician_name: None,
        reports: units,
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryJobStore {
    jobs: Arc<Mutex<Vec<SentJobRecord>>>,
}

impl MemoryJobStore {
    pub(super) fn with_jobs(jobs: Vec<SentJobRecord>) -> Self {
        Self {
            jobs: Arc::new(Mutex::new(jobs)),
        }
    }
}

impl JobStore for MemoryJobStore {
    fn load_sent_jobs(&self) -> Result<Vec<SentJobRecord>, StoreError> {
        Ok(self.jobs.lock().expect("job store mutex poisoned").clone())
    }
}

pub(super) struct FailingJobStore;

impl JobStore for FailingJobStore {
    fn load_sent_jobs(&self) -> Result<Vec<SentJobRecord>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }
}

#[derive(Default)]
pub(super) struct MemoryLedger {
    entries: Arc<Mutex<Vec<LedgerEntry>>>,
}

impl MemoryLedger {
    pub(super) fn entries(&self) -> Vec<LedgerEntry> {
        self.entries.lock().expect("ledger mutex poisoned").clone()
    }

    pub(super) fn seed(&self, entry: LedgerEntry) {
        self.entries
            .lock()
            .expect("ledger mutex poisoned")
            .push(entry);
    }
}

impl NotificationLedger for MemoryLedger {
    fn find(&self, query: &LedgerQuery) -> Result<Vec<LedgerEntry>, LedgerError> {
        let entries = self.entries.lock().expect("ledger mutex poisoned");
        Ok(entries
            .iter()
            .filter(|entry| entry.subject == query.subject)
            .filter(|entry| {
                query
                    .recipient
                    .as_ref()
                    .map_or(true, |recipient| &entry.recipient == recipient)
            })
            .filter(|entry| {
                query
                    .job_id
                    .as_ref()
                    .map_or(true, |job_id| entry.job_id.as_ref() == Some(job_id))
            })
            .filter(|entry| {
                query
                    .sent_after
                    .map_or(true, |bound| entry.sent_at >= bound)
            })
            .cloned()
            .collect())
    }

    fn record(&self, entry: LedgerEntry) -> Result<(), LedgerError> {
        self.entries
            .lock()
            .expect("ledger mutex poisoned")
            .push(entry);
        Ok(())
    }
}

pub(super) struct UnavailableLedger;

impl NotificationLedger for UnavailableLedger {
    fn find(&self, _query: &LedgerQuery) -> Result<Vec<LedgerEntry>, LedgerError> {
        Err(LedgerError::Unavailable("ledger offline".to_string()))
    }

    fn record(&self, _entry: LedgerEntry) -> Result<(), LedgerError> {
        Err(LedgerError::Unavailable("ledger offline".to_string()))
    }
}

/// Captures outgoing messages; optionally rejects everything addressed to
/// one recipient so partial-failure behavior can be exercised.
#[derive(Default)]
pub(super) struct RecordingTransport {
    messages: Arc<Mutex<Vec<EmailMessage>>>,
    reject_recipient: Option<String>,
    sequence: AtomicU64,
}

impl RecordingTransport {
    pub(super) fn rejecting(recipient: &str) -> Self {
        Self {
            reject_recipient: Some(recipient.to_string()),
            ..Self::default()
        }
    }

    pub(super) fn messages(&self) -> Vec<EmailMessage> {
        self.messages
            .lock()
            .expect("transport mutex poisoned")
            .clone()
    }
}

impl EmailTransport for RecordingTransport {
    fn send(&self, message: &EmailMessage) -> Result<EmailReceipt, TransportError> {
        if self.reject_recipient.as_deref() == Some(message.to.as_str()) {
            return Err(TransportError::Rejected("mailbox unavailable".to_string()));
        }
        self.messages
            .lock()
            .expect("transport mutex poisoned")
            .push(message.clone());
        let id = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        Ok(EmailReceipt {
            provider_message_id: format!("msg-{id:04}"),
        })
    }
}

pub(super) fn build_service(
    jobs: Vec<SentJobRecord>,
) -> (
    RenewalScanService<MemoryJobStore, MemoryLedger, RecordingTransport>,
    Arc<MemoryLedger>,
    Arc<RecordingTransport>,
) {
    build_service_with_transport(jobs, RecordingTransport::default())
}

pub(super) fn build_service_with_transport(
    jobs: Vec<SentJobRecord>,
    transport: RecordingTransport,
) -> (
    RenewalScanService<MemoryJobStore, MemoryLedger, RecordingTransport>,
    Arc<MemoryLedger>,
    Arc<RecordingTransport>,
) {
    let store = Arc::new(MemoryJobStore::with_jobs(jobs));
    let ledger = Arc::new(MemoryLedger::default());
    let transport = Arc::new(transport);
    let service = RenewalScanService::new(store, ledger.clone(), transport.clone(), SENDER);
    (service, ledger, transport)
}
