use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::info;

use super::deadline::{days_remaining, NOTICE_LEAD_DAYS};
use super::dispatch::NoticeDispatcher;
use super::domain::{CustomerId, JobId};
use super::guard::{already_notified_digest, already_notified_single};
use super::notice::{single_notice_subject, DIGEST_SUBJECT};
use super::repository::{EmailTransport, JobStore, NotificationLedger, StoreError};
use super::snapshot::{
    build_scan_plan, CustomerDigest, EntityError, EntityRef, ExpirationOverview, SingleCandidate,
};

/// One dispatched notification, as reported back to the trigger caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentNotice {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<JobId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<CustomerId>,
    pub recipient: String,
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_inspection_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub units: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_message_id: Option<String>,
}

/// Result of one full scan pass.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub notifications_sent: usize,
    pub sent: Vec<SentNotice>,
    pub errors: Vec<EntityError>,
    pub overview: ExpirationOverview,
}

/// Fatal, run-level failures. Everything below the snapshot load is caught
/// at the entity boundary and collected in the summary instead.
#[derive(Debug, thiserror::Error)]
pub enum RenewalRunError {
    #[error("failed to load job snapshot: {0}")]
    Load(#[from] StoreError),
}

/// Orchestrates one pass over all eligible jobs: load, aggregate, then per
/// entity classify, deduplicate, and dispatch. Collaborators are injected so
/// tests can substitute in-memory fakes.
pub struct RenewalScanService<S, L, T> {
    store: Arc<S>,
    ledger: Arc<L>,
    dispatcher: NoticeDispatcher<L, T>,
}

impl<S, L, T> RenewalScanService<S, L, T>
where
    S: JobStore + 'static,
    L: NotificationLedger + 'static,
    T: EmailTransport + 'static,
{
    pub fn new(
        store: Arc<S>,
        ledger: Arc<L>,
        transport: Arc<T>,
        sender_contact: impl Into<String>,
    ) -> Self {
        let dispatcher = NoticeDispatcher::new(ledger.clone(), transport, sender_contact);
        Self {
            store,
            ledger,
            dispatcher,
        }
    }

    /// Executes one full scan over the delivered-job snapshot.
    ///
    /// The snapshot is taken once up front and never re-read mid-run. No
    /// entity's failure aborts the batch; the run always proceeds to
    /// completion over its snapshot and reports per-entity errors.
    pub fn run(&self, now: DateTime<Utc>) -> Result<RunSummary, RenewalRunError> {
        let today = now.date_naive();
        let jobs = self.store.load_sent_jobs()?;
        let plan = build_scan_plan(jobs, today);
        info!(
            singles = plan.singles.len(),
            digests = plan.digests.len(),
            "renewal scan snapshot loaded"
        );

        let mut sent = Vec::new();
        let mut errors = plan.skipped;

        for candidate in &plan.singles {
            if days_remaining(candidate.deadline, today) != NOTICE_LEAD_DAYS {
                continue;
            }
            self.process_single(candidate, now, &mut sent, &mut errors);
        }

        for digest in &plan.digests {
            self.process_digest(digest, now, &mut sent, &mut errors);
        }

        info!(
            notifications_sent = sent.len(),
            errors = errors.len(),
            "renewal scan complete"
        );

        Ok(RunSummary {
            notifications_sent: sent.len(),
            sent,
            errors,
            overview: plan.overview,
        })
    }

    fn process_single(
        &self,
        candidate: &SingleCandidate,
        now: DateTime<Utc>,
        sent: &mut Vec<SentNotice>,
        errors: &mut Vec<EntityError>,
    ) {
        let entity = EntityRef::Job(candidate.job_id.clone());
        let subject = single_notice_subject(&candidate.inspection_address);

        match already_notified_single(self.ledger.as_ref(), &candidate.job_id, &subject) {
            Ok(true) => return,
            Ok(false) => {}
            Err(err) => {
                errors.push(EntityError {
                    entity,
                    message: format!("ledger lookup failed: {err}"),
                });
                return;
            }
        }

        match self.dispatcher.dispatch_single(candidate, now) {
            Ok(outcome) if outcome.delivered => sent.push(SentNotice {
                job_id: Some(candidate.job_id.clone()),
                customer_id: None,
                recipient: candidate.recipient.clone(),
                subject: outcome.subject,
                next_inspection_date: Some(candidate.deadline),
                units: None,
                provider_message_id: outcome.provider_message_id,
            }),
            Ok(outcome) => errors.push(EntityError {
                entity,
                message: outcome
                    .failure
                    .unwrap_or_else(|| "delivery failed".to_string()),
            }),
            Err(err) => errors.push(EntityError {
                entity,
                message: format!("ledger write failed: {err}"),
            }),
        }
    }

    fn process_digest(
        &self,
        digest: &CustomerDigest,
        now: DateTime<Utc>,
        sent: &mut Vec<SentNotice>,
        errors: &mut Vec<EntityError>,
    ) {
        let entity = EntityRef::Customer(digest.customer_id.clone());

        match already_notified_digest(self.ledger.as_ref(), &digest.recipient, DIGEST_SUBJECT, now)
        {
            Ok(true) => return,
            Ok(false) => {}
            Err(err) => {
                errors.push(EntityError {
                    entity,
                    message: format!("ledger lookup failed: {err}"),
                });
                return;
            }
        }

        match self.dispatcher.dispatch_digest(digest, now) {
            Ok(outcome) if outcome.delivered => sent.push(SentNotice {
                job_id: None,
                customer_id: Some(digest.customer_id.clone()),
                recipient: digest.recipient.clone(),
                subject: outcome.subject,
                next_inspection_date: None,
                units: Some(digest.unit_count()),
                provider_message_id: outcome.provider_message_id,
            }),
            Ok(outcome) => errors.push(EntityError {
                entity,
                message: outcome
                    .failure
                    .unwrap_or_else(|| "delivery failed".to_string()),
            }),
            Err(err) => errors.push(EntityError {
                entity,
                message: format!("ledger write failed: {err}"),
            }),
        }
    }
}
