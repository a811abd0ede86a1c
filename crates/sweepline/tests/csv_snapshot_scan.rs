use std::io::Cursor;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};
use sweepline::workflows::renewal::{
    EmailMessage, EmailReceipt, EmailTransport, JobStore, LedgerEntry, LedgerError, LedgerQuery,
    NotificationLedger, RenewalScanService, SentJobRecord, SnapshotCsvImporter, StoreError,
    TransportError, DIGEST_SUBJECT, NOTICE_LEAD_DAYS,
};

fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 4, 17, 6, 0, 0)
        .single()
        .expect("valid timestamp")
}

struct SnapshotStore {
    jobs: Vec<SentJobRecord>,
}

impl JobStore for SnapshotStore {
    fn load_sent_jobs(&self) -> Result<Vec<SentJobRecord>, StoreError> {
        Ok(self.jobs.clone())
    }
}

#[derive(Default)]
struct MemoryLedger {
    entries: Mutex<Vec<LedgerEntry>>,
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

#[derive(Default)]
struct CapturingTransport {
    messages: Mutex<Vec<EmailMessage>>,
    sequence: AtomicU64,
}

impl CapturingTransport {
    fn messages(&self) -> Vec<EmailMessage> {
        self.messages
            .lock()
            .expect("transport mutex poisoned")
            .clone()
    }
}

impl EmailTransport for CapturingTransport {
    fn send(&self, message: &EmailMessage) -> Result<EmailReceipt, TransportError> {
        self.messages
            .lock()
            .expect("transport mutex poisoned")
            .push(message.clone());
        let id = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        Ok(EmailReceipt {
            provider_message_id: format!("stub-{id:04}"),
        })
    }
}

fn export_csv() -> String {
    let today = fixed_now().date_naive();
    let due = today + Duration::days(NOTICE_LEAD_DAYS);
    let later = today + Duration::days(90);
    let inspected = today - Duration::days(300);

    let mut csv = String::from(
        "job_id,kind,status,company_id,customer_id,customer_name,customer_email,\
         inspection_address,inspection_date,technician,unit_label,contact_email,next_inspection_date\n",
    );
    // a single-inspection job right at the notice mark
    csv.push_str(&format!(
        "job-1,inspection,sent,co-1,cust-1,Petr Dvorak,petr@example.com,Brnenska 8,{inspected},Karel Novak,,,{due}\n"
    ));
    // a single-inspection job that is not due yet
    csv.push_str(&format!(
        "job-2,inspection,sent,co-1,cust-2,Eva Mala,eva@example.com,Videnska 44,{inspected},Karel Novak,,,{later}\n"
    ));
    // a passport with two buildings owned by the same customer
    csv.push_str(&format!(
        "job-3,passport,sent,co-1,cust-3,Jana Svobodova,jana@example.com,Hlavni 12,{inspected},,1A,,{due}\n"
    ));
    csv.push_str(&format!(
        "job-3,passport,sent,co-1,cust-3,Jana Svobodova,jana@example.com,Hlavni 12,{inspected},,1B,,{later}\n"
    ));
    csv.push_str(&format!(
        "job-4,passport,sent,co-1,cust-3,Jana Svobodova,jana@example.com,Nadrazni 3,{inspected},,5,,{due}\n"
    ));
    // a draft job that must not enter the snapshot at all
    csv.push_str(&format!(
        "job-5,inspection,draft,co-1,cust-4,Pavel Maly,pavel@example.com,Polni 1,{inspected},,,,\n"
    ));
    csv
}

#[test]
fn imported_snapshot_flows_through_a_full_scan() {
    let jobs =
        SnapshotCsvImporter::from_reader(Cursor::new(export_csv())).expect("export imports");
    assert_eq!(jobs.len(), 4, "draft job stays out of the snapshot");

    let store = Arc::new(SnapshotStore { jobs });
    let ledger = Arc::new(MemoryLedger::default());
    let transport = Arc::new(CapturingTransport::default());
    let service = RenewalScanService::new(
        store,
        ledger.clone(),
        transport.clone(),
        "info@sweepline.cz",
    );

    let summary = service.run(fixed_now()).expect("run completes");

    // one single notice plus one digest covering both of Jana's buildings
    assert_eq!(summary.notifications_sent, 2);
    assert!(summary.errors.is_empty());

    let messages = transport.messages();
    assert_eq!(messages.len(), 2);
    assert!(messages.iter().any(|message| message.to == "petr@example.com"));
    let digest = messages
        .iter()
        .find(|message| message.subject == DIGEST_SUBJECT)
        .expect("digest present");
    assert_eq!(digest.to, "jana@example.com");
    assert!(digest.html_body.contains("Hlavni 12"));
    assert!(digest.html_body.contains("Nadrazni 3"));
    assert!(!digest.html_body.contains("1B"));
}

#[test]
fn rerunning_over_the_same_snapshot_is_idempotent() {
    let jobs =
        SnapshotCsvImporter::from_reader(Cursor::new(export_csv())).expect("export imports");
    let store = Arc::new(SnapshotStore { jobs });
    let ledger = Arc::new(MemoryLedger::default());
    let transport = Arc::new(CapturingTransport::default());
    let service = RenewalScanService::new(
        store,
        ledger.clone(),
        transport.clone(),
        "info@sweepline.cz",
    );

    let first = service.run(fixed_now()).expect("first run completes");
    let second = service.run(fixed_now()).expect("second run completes");

    assert_eq!(first.notifications_sent, 2);
    assert_eq!(second.notifications_sent, 0);
    assert_eq!(transport.messages().len(), 2);
}
