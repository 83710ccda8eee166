use chrono::{DateTime, Duration, NaiveTime, Offset, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Half-open interval `[start, end)` over which one cycle reads records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl AggregationWindow {
    /// From local midnight of `now`'s day up to `now`.
    pub fn today<Tz: TimeZone>(now: &DateTime<Tz>) -> Self {
        let midnight = now.date_naive().and_time(NaiveTime::MIN);
        let start = match midnight.and_local_timezone(now.timezone()).earliest() {
            Some(local) => local.with_timezone(&Utc),
            // Midnight skipped by a DST jump: fall back to the current offset.
            None => {
                let offset = now.offset().fix().local_minus_utc();
                Utc.from_utc_datetime(&(midnight - Duration::seconds(i64::from(offset))))
            }
        };
        Self {
            start,
            end: now.with_timezone(&Utc),
        }
    }

    pub fn contains(&self, at: &DateTime<Utc>) -> bool {
        *at >= self.start && *at < self.end
    }
}
