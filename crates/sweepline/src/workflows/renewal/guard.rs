use chrono::{DateTime, Duration, Utc};

use super::domain::JobId;
use super::repository::{LedgerError, LedgerQuery, NotificationLedger};

/// Lookback window for passport digests. A second digest to the same
/// recipient inside this window is suppressed even when it would cover a
/// different building; the coarse window is what keeps a twice-invoked batch
/// from sending near-duplicate digests.
pub const DIGEST_WINDOW_HOURS: i64 = 24;

/// A single-inspection notice is already handled when any ledger entry
/// exists for the job/subject pair, with no time bound. The subject embeds
/// the inspection address rather than the date, so this pairs with the scan
/// only firing at the exact lead-day mark.
pub fn already_notified_single<L>(
    ledger: &L,
    job_id: &JobId,
    subject: &str,
) -> Result<bool, LedgerError>
where
    L: NotificationLedger + ?Sized,
{
    let query = LedgerQuery {
        recipient: None,
        subject: subject.to_string(),
        job_id: Some(job_id.clone()),
        sent_after: None,
    };
    Ok(!ledger.find(&query)?.is_empty())
}

/// A digest is already handled when an entry for the recipient and the fixed
/// digest subject exists within the last [`DIGEST_WINDOW_HOURS`].
pub fn already_notified_digest<L>(
    ledger: &L,
    recipient: &str,
    subject: &str,
    now: DateTime<Utc>,
) -> Result<bool, LedgerError>
where
    L: NotificationLedger + ?Sized,
{
    let query = LedgerQuery {
        recipient: Some(recipient.to_string()),
        subject: subject.to_string(),
        job_id: None,
        sent_after: Some(now - Duration::hours(DIGEST_WINDOW_HOURS)),
    };
    Ok(!ledger.find(&query)?.is_empty())
}
