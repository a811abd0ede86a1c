use chrono::{Datelike, NaiveDate};

use super::domain::ExpirationStatus;

/// Lead time, in days, between the renewal notice and the deadline itself.
/// The scan fires a notice only when a deadline is exactly this many days
/// out; the notification ledger is the safety net for runs that skip a day.
pub const NOTICE_LEAD_DAYS: i64 = 14;

/// Computes the re-inspection deadline for one report.
///
/// An explicit next-inspection date recorded by the technician wins verbatim;
/// otherwise the deadline is the legal default of one calendar year after the
/// inspection.
pub fn renewal_deadline(
    inspection_date: NaiveDate,
    explicit_next: Option<NaiveDate>,
) -> NaiveDate {
    explicit_next.unwrap_or_else(|| add_one_year(inspection_date))
}

/// Whole calendar days between today and the deadline. Negative once the
/// deadline has passed.
pub fn days_remaining(deadline: NaiveDate, today: NaiveDate) -> i64 {
    deadline.signed_duration_since(today).num_days()
}

/// Maps a day count onto the derived expiration status.
pub fn classify(days_remaining: i64) -> ExpirationStatus {
    if days_remaining < 0 {
        ExpirationStatus::Expired
    } else if days_remaining <= NOTICE_LEAD_DAYS {
        ExpirationStatus::ExpiringSoon
    } else {
        ExpirationStatus::Active
    }
}

/// Same month and day one year later. A Feb 29 inspection whose anniversary
/// lands in a non-leap year clamps to Feb 28.
fn add_one_year(date: NaiveDate) -> NaiveDate {
    let year = date.year() + 1;
    NaiveDate::from_ymd_opt(year, date.month(), date.day())
        .unwrap_or_else(|| NaiveDate::from_ymd_opt(year, 2, 28).expect("Feb 28 exists every year"))
}
