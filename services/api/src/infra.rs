use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use sweepline::workflows::renewal::{
    EmailMessage, EmailReceipt, EmailTransport, JobStore, LedgerEntry, LedgerError, LedgerQuery,
    NotificationLedger, SentJobRecord, StoreError, TransportError,
};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

/// Snapshot-backed job store for local runs. The managed relational store
/// lives behind deployment glue outside this repository.
#[derive(Default, Clone)]
pub(crate) struct InMemoryJobStore {
    jobs: Arc<Mutex<Vec<SentJobRecord>>>,
}

impl InMemoryJobStore {
    pub(crate) fn with_jobs(jobs: Vec<SentJobRecord>) -> Self {
        Self {
            jobs: Arc::new(Mutex::new(jobs)),
        }
    }
}

impl JobStore for InMemoryJobStore {
    fn load_sent_jobs(&self) -> Result<Vec<SentJobRecord>, StoreError> {
        Ok(self.jobs.lock().expect("job store mutex poisoned").clone())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryNotificationLedger {
    entries: Arc<Mutex<Vec<LedgerEntry>>>,
}

impl NotificationLedger for InMemoryNotificationLedger {
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
            .filter(|entry| query.sent_after.map_or(true, |bound| entry.sent_at >= bound))
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

/// Logs each send and fabricates a receipt. Stands in for the transactional
/// provider adapter during local runs and dry-run scans.
#[derive(Default)]
pub(crate) struct StubEmailTransport {
    sequence: AtomicU64,
}

impl EmailTransport for StubEmailTransport {
    fn send(&self, message: &EmailMessage) -> Result<EmailReceipt, TransportError> {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        info!(to = %message.to, subject = %message.subject, "stub transport accepted message");
        Ok(EmailReceipt {
            provider_message_id: format!("stub-{id:06}"),
        })
    }
}
