use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::warn;

use super::deadline::NOTICE_LEAD_DAYS;
use super::notice::{render_digest, render_single_notice, single_notice_subject, DIGEST_SUBJECT};
use super::repository::{
    DeliveryStatus, EmailMessage, EmailTransport, LedgerEntry, LedgerError, NotificationLedger,
};
use super::snapshot::{CustomerDigest, SingleCandidate};

/// Outcome of one dispatch attempt.
///
/// `delivered == false` means the provider rejected the message. No ledger
/// entry is written in that case, so a later run is free to retry the same
/// entity; `failure` carries the provider error for the run summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub delivered: bool,
    pub subject: String,
    pub provider_message_id: Option<String>,
    pub failure: Option<String>,
}

/// Renders notification content, invokes the email transport once, and
/// records the outcome in the ledger.
pub struct NoticeDispatcher<L, T> {
    ledger: Arc<L>,
    transport: Arc<T>,
    sender_contact: String,
}

impl<L, T> NoticeDispatcher<L, T>
where
    L: NotificationLedger,
    T: EmailTransport,
{
    pub fn new(ledger: Arc<L>, transport: Arc<T>, sender_contact: impl Into<String>) -> Self {
        Self {
            ledger,
            transport,
            sender_contact: sender_contact.into(),
        }
    }

    /// Sends a single-inspection renewal notice and records it. Errors only
    /// on ledger writes; provider rejections come back as `delivered: false`.
    pub fn dispatch_single(
        &self,
        candidate: &SingleCandidate,
        now: DateTime<Utc>,
    ) -> Result<DispatchOutcome, LedgerError> {
        let subject = single_notice_subject(&candidate.inspection_address);
        let message = EmailMessage {
            to: candidate.recipient.clone(),
            subject: subject.clone(),
            html_body: render_single_notice(candidate, &self.sender_contact),
        };

        let receipt = match self.transport.send(&message) {
            Ok(receipt) => receipt,
            Err(err) => {
                warn!(job = %candidate.job_id.0, error = %err, "renewal notice rejected by transport");
                return Ok(DispatchOutcome {
                    delivered: false,
                    subject,
                    provider_message_id: None,
                    failure: Some(err.to_string()),
                });
            }
        };

        self.ledger.record(LedgerEntry {
            company_id: Some(candidate.company_id.clone()),
            job_id: Some(candidate.job_id.clone()),
            recipient: candidate.recipient.clone(),
            subject: subject.clone(),
            payload: json!({
                "type": "expiration_reminder",
                "days_until_expiration": NOTICE_LEAD_DAYS,
                "next_inspection_date": candidate.deadline,
            }),
            status: DeliveryStatus::Sent,
            provider_message_id: Some(receipt.provider_message_id.clone()),
            sent_at: now,
        })?;

        Ok(DispatchOutcome {
            delivered: true,
            subject,
            provider_message_id: Some(receipt.provider_message_id),
            failure: None,
        })
    }

    /// Sends a per-customer passport digest and records it. The ledger entry
    /// keeps the job id only when the digest covers exactly one building.
    pub fn dispatch_digest(
        &self,
        digest: &CustomerDigest,
        now: DateTime<Utc>,
    ) -> Result<DispatchOutcome, LedgerError> {
        let message = EmailMessage {
            to: digest.recipient.clone(),
            subject: DIGEST_SUBJECT.to_string(),
            html_body: render_digest(digest, &self.sender_contact),
        };

        let receipt = match self.transport.send(&message) {
            Ok(receipt) => receipt,
            Err(err) => {
                warn!(customer = %digest.customer_id.0, error = %err, "renewal digest rejected by transport");
                return Ok(DispatchOutcome {
                    delivered: false,
                    subject: DIGEST_SUBJECT.to_string(),
                    provider_message_id: None,
                    failure: Some(err.to_string()),
                });
            }
        };

        let job_id = match digest.buildings.as_slice() {
            [only] => Some(only.job_id.clone()),
            _ => None,
        };

        self.ledger.record(LedgerEntry {
            company_id: Some(digest.company_id.clone()),
            job_id,
            recipient: digest.recipient.clone(),
            subject: DIGEST_SUBJECT.to_string(),
            payload: json!({
                "type": "expiration_digest",
                "days_until_expiration": NOTICE_LEAD_DAYS,
                "buildings": digest.buildings,
            }),
            status: DeliveryStatus::Sent,
            provider_message_id: Some(receipt.provider_message_id.clone()),
            sent_at: now,
        })?;

        Ok(DispatchOutcome {
            delivered: true,
            subject: DIGEST_SUBJECT.to_string(),
            provider_message_id: Some(receipt.provider_message_id),
            failure: None,
        })
    }
}
