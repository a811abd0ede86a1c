use chrono::Duration;
use serde_json::json;

use super::common::*;
use crate::workflows::renewal::domain::JobId;
use crate::workflows::renewal::guard::{
    already_notified_digest, already_notified_single, DIGEST_WINDOW_HOURS,
};
use crate::workflows::renewal::repository::{DeliveryStatus, LedgerEntry};

fn entry(job_id: Option<&str>, recipient: &str, subject: &str, age_hours: i64) -> LedgerEntry {
    LedgerEntry {
        company_id: None,
        job_id: job_id.map(|id| JobId(id.to_string())),
        recipient: recipient.to_string(),
        subject: subject.to_string(),
        payload: json!({}),
        status: DeliveryStatus::Sent,
        provider_message_id: None,
        sent_at: fixed_now() - Duration::hours(age_hours),
    }
}

#[test]
fn single_match_is_keyed_on_job_and_subject_without_time_bound() {
    let ledger = MemoryLedger::default();
    ledger.seed(entry(
        Some("j1"),
        "someone-else@example.com",
        "Inspection renewal notice - Hlavni 12",
        24 * 365,
    ));

    let hit = already_notified_single(
        &ledger,
        &JobId("j1".to_string()),
        "Inspection renewal notice - Hlavni 12",
    )
    .expect("lookup succeeds");
    assert!(hit);

    let other_job = already_notified_single(
        &ledger,
        &JobId("j2".to_string()),
        "Inspection renewal notice - Hlavni 12",
    )
    .expect("lookup succeeds");
    assert!(!other_job);

    let other_subject = already_notified_single(
        &ledger,
        &JobId("j1".to_string()),
        "Inspection renewal notice - Nadrazni 3",
    )
    .expect("lookup succeeds");
    assert!(!other_subject);
}

#[test]
fn digest_match_is_bounded_by_the_lookback_window() {
    let ledger = MemoryLedger::default();
    ledger.seed(entry(None, "jana@example.com", "digest", DIGEST_WINDOW_HOURS + 6));

    let stale = already_notified_digest(&ledger, "jana@example.com", "digest", fixed_now())
        .expect("lookup succeeds");
    assert!(!stale);

    ledger.seed(entry(None, "jana@example.com", "digest", 1));
    let fresh = already_notified_digest(&ledger, "jana@example.com", "digest", fixed_now())
        .expect("lookup succeeds");
    assert!(fresh);
}

#[test]
fn digest_match_ignores_other_recipients() {
    let ledger = MemoryLedger::default();
    ledger.seed(entry(None, "petr@example.com", "digest", 1));

    let hit = already_notified_digest(&ledger, "jana@example.com", "digest", fixed_now())
        .expect("lookup succeeds");
    assert!(!hit);
}

#[test]
fn lookup_failure_propagates_instead_of_guessing() {
    let ledger = UnavailableLedger;
    let result = already_notified_single(&ledger, &JobId("j1".to_string()), "subject");
    assert!(result.is_err());
}
