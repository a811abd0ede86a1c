use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use super::deadline::{classify, days_remaining, renewal_deadline, NOTICE_LEAD_DAYS};
use super::domain::{
    CompanyId, CustomerId, ExpirationStatus, JobId, JobKind, SentJobRecord,
};

/// Single-inspection job queued for deadline evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingleCandidate {
    pub job_id: JobId,
    pub company_id: CompanyId,
    pub recipient: String,
    pub customer_name: Option<String>,
    pub inspection_address: String,
    pub inspection_date: NaiveDate,
    pub technician_name: Option<String>,
    pub deadline: NaiveDate,
}

/// One expiring unit retained for a customer digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpiringUnit {
    pub unit_label: String,
    pub deadline: NaiveDate,
}

/// Building section of a digest: every expiring unit within one passport job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpiringBuilding {
    pub job_id: JobId,
    pub address: String,
    pub units: Vec<ExpiringUnit>,
}

/// Per-customer digest covering the expiring units across all of that
/// customer's buildings. One email per digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerDigest {
    pub customer_id: CustomerId,
    pub company_id: CompanyId,
    pub recipient: String,
    pub customer_name: Option<String>,
    pub buildings: Vec<ExpiringBuilding>,
}

impl CustomerDigest {
    pub fn unit_count(&self) -> usize {
        self.buildings.iter().map(|b| b.units.len()).sum()
    }
}

/// Derived active/expiring/expired counts over every report in the snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExpirationOverview {
    pub active: usize,
    pub expiring_soon: usize,
    pub expired: usize,
}

impl ExpirationOverview {
    fn tally(&mut self, status: ExpirationStatus) {
        match status {
            ExpirationStatus::Active => self.active += 1,
            ExpirationStatus::ExpiringSoon => self.expiring_soon += 1,
            ExpirationStatus::Expired => self.expired += 1,
        }
    }
}

/// Reference to the entity a scan failure is attributed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityRef {
    Job(JobId),
    Customer(CustomerId),
}

/// Structured per-entity failure carried through the run summary. Failures
/// never abort the run; they are collected and reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityError {
    pub entity: EntityRef,
    pub message: String,
}

/// Snapshot split into dispatch candidates plus derived statistics.
#[derive(Debug, Default)]
pub struct ScanPlan {
    pub singles: Vec<SingleCandidate>,
    pub digests: Vec<CustomerDigest>,
    pub skipped: Vec<EntityError>,
    pub overview: ExpirationOverview,
}

/// Splits the loaded snapshot by job kind.
///
/// Single-inspection jobs become candidates carrying their one report and a
/// resolved recipient; passport jobs are grouped by building and then by
/// owning customer, retaining only the units whose deadline is exactly
/// [`NOTICE_LEAD_DAYS`] out. Zero-report passports and customers with no
/// expiring units contribute nothing downstream.
pub fn build_scan_plan(jobs: Vec<SentJobRecord>, today: NaiveDate) -> ScanPlan {
    let mut plan = ScanPlan::default();
    let mut digests: BTreeMap<CustomerId, CustomerDigest> = BTreeMap::new();

    for job in jobs {
        match job.kind {
            JobKind::SingleInspection => collect_single(&mut plan, job, today),
            JobKind::Passport => collect_passport(&mut plan, &mut digests, job, today),
        }
    }

    plan.digests = digests.into_values().collect();
    plan
}

fn collect_single(plan: &mut ScanPlan, job: SentJobRecord, today: NaiveDate) {
    let payload = job.reports.first();
    let deadline = renewal_deadline(
        job.inspection_date,
        payload.and_then(|report| report.next_inspection_date),
    );
    plan.overview.tally(classify(days_remaining(deadline, today)));

    let recipient = job
        .customer
        .as_ref()
        .map(|customer| customer.email.clone())
        .filter(|email| !email.is_empty())
        .or_else(|| {
            payload
                .and_then(|report| report.contact_email.clone())
                .filter(|email| !email.is_empty())
        });

    let Some(recipient) = recipient else {
        plan.skipped.push(EntityError {
            entity: EntityRef::Job(job.job_id),
            message: "no recipient email resolved".to_string(),
        });
        return;
    };

    let customer_name = job
        .customer
        .as_ref()
        .map(|customer| customer.name.clone())
        .filter(|name| !name.is_empty())
        .or_else(|| payload.and_then(|report| report.customer_name.clone()));

    plan.singles.push(SingleCandidate {
        job_id: job.job_id,
        company_id: job.company_id,
        recipient,
        customer_name,
        inspection_address: job.inspection_address,
        inspection_date: job.inspection_date,
        technician_name: job.technician_name,
        deadline,
    });
}

fn collect_passport(
    plan: &mut ScanPlan,
    digests: &mut BTreeMap<CustomerId, CustomerDigest>,
    job: SentJobRecord,
    today: NaiveDate,
) {
    if job.reports.is_empty() {
        return;
    }

    let mut units = Vec::new();
    for (index, report) in job.reports.iter().enumerate() {
        let deadline = renewal_deadline(job.inspection_date, report.next_inspection_date);
        let days = days_remaining(deadline, today);
        plan.overview.tally(classify(days));

        if days == NOTICE_LEAD_DAYS {
            let unit_label = report
                .unit_label
                .clone()
                .filter(|label| !label.is_empty())
                .unwrap_or_else(|| format!("unit {}", index + 1));
            units.push(ExpiringUnit { unit_label, deadline });
        }
    }

    if units.is_empty() {
        return;
    }

    let Some(customer) = job.customer else {
        plan.skipped.push(EntityError {
            entity: EntityRef::Job(job.job_id),
            message: "passport job has no owning customer".to_string(),
        });
        return;
    };

    let recipient = if customer.email.is_empty() {
        job.reports
            .iter()
            .find_map(|report| report.contact_email.clone())
            .filter(|email| !email.is_empty())
    } else {
        Some(customer.email.clone())
    };

    let Some(recipient) = recipient else {
        plan.skipped.push(EntityError {
            entity: EntityRef::Customer(customer.id),
            message: "no recipient email resolved".to_string(),
        });
        return;
    };

    let digest = digests
        .entry(customer.id.clone())
        .or_insert_with(|| CustomerDigest {
            customer_id: customer.id.clone(),
            company_id: job.company_id.clone(),
            recipient,
            customer_name: Some(customer.name.clone()).filter(|name| !name.is_empty()),
            buildings: Vec::new(),
        });

    digest.buildings.push(ExpiringBuilding {
        job_id: job.job_id,
        address: job.inspection_address,
        units,
    });
}
