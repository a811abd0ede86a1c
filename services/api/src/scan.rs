use crate::infra::{parse_date, InMemoryJobStore, InMemoryNotificationLedger, StubEmailTransport};
use chrono::{NaiveDate, Utc};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use sweepline::config::AppConfig;
use sweepline::error::AppError;
use sweepline::workflows::renewal::{
    EntityRef, RenewalScanService, RunSummary, SnapshotCsvImporter,
};

#[derive(Args, Debug)]
pub(crate) struct ScanArgs {
    /// CSV export of the jobs table (one row per report)
    #[arg(long)]
    pub(crate) jobs_csv: PathBuf,
    /// Evaluate deadlines as of this date instead of today (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

/// Dry-runs the pipeline over an exported snapshot: sends go to the stub
/// transport, ledger entries stay in memory, and the summary is printed.
pub(crate) fn run_scan(args: ScanArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let jobs = SnapshotCsvImporter::from_path(&args.jobs_csv)?;
    let job_count = jobs.len();

    let now = match args.today {
        Some(date) => date
            .and_hms_opt(0, 0, 0)
            .expect("midnight is valid")
            .and_utc(),
        None => Utc::now(),
    };

    let store = Arc::new(InMemoryJobStore::with_jobs(jobs));
    let ledger = Arc::new(InMemoryNotificationLedger::default());
    let transport = Arc::new(StubEmailTransport::default());
    let service = RenewalScanService::new(store, ledger, transport, config.renewal.email_from);

    let summary = service.run(now)?;
    render_summary(&summary, job_count, &args.jobs_csv, now.date_naive());

    Ok(())
}

fn render_summary(summary: &RunSummary, job_count: usize, source: &PathBuf, today: NaiveDate) {
    println!("Renewal scan dry run");
    println!(
        "Snapshot: {} sent job(s) from {} (evaluated {})",
        job_count,
        source.display(),
        today
    );

    println!(
        "\nOverview: {} active, {} expiring soon, {} expired",
        summary.overview.active, summary.overview.expiring_soon, summary.overview.expired
    );

    if summary.sent.is_empty() {
        println!("\nNotifications: none due today");
    } else {
        println!("\nNotifications ({})", summary.notifications_sent);
        for notice in &summary.sent {
            match notice.units {
                Some(units) => println!(
                    "- digest to {} covering {} unit(s)",
                    notice.recipient, units
                ),
                None => println!("- {} | {}", notice.recipient, notice.subject),
            }
        }
    }

    if summary.errors.is_empty() {
        println!("\nErrors: none");
    } else {
        println!("\nErrors ({})", summary.errors.len());
        for error in &summary.errors {
            println!("- {}: {}", entity_label(&error.entity), error.message);
        }
    }
}

fn entity_label(entity: &EntityRef) -> String {
    match entity {
        EntityRef::Job(id) => format!("job {}", id.0),
        EntityRef::Customer(id) => format!("customer {}", id.0),
    }
}
