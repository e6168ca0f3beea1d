//! Calendar-day buckets used to deduplicate automatic work orders.
//!
//! A day is the half-open interval `[start, start + 24h)` in the registry's
//! canonical time zone, expressed here as a fixed UTC offset. At most one
//! automatic job may exist per contract per bucket.

use chrono::{Duration, FixedOffset, NaiveDate, NaiveTime};

use crate::error::CoreError;
use crate::types::Timestamp;

/// Seconds in one minute, for offset conversion.
const SECS_PER_MINUTE: i32 = 60;

/// One calendar day in the canonical zone, with its UTC bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    /// The calendar date in the canonical zone. Used as the uniqueness key.
    pub day: NaiveDate,
    /// Inclusive lower bound.
    pub start: Timestamp,
    /// Exclusive upper bound.
    pub end: Timestamp,
}

impl DayWindow {
    /// The window containing `instant`.
    pub fn containing(instant: Timestamp, offset: FixedOffset) -> Self {
        let day = instant.with_timezone(&offset).date_naive();
        Self::for_day(day, offset)
    }

    /// The window for a given calendar date.
    pub fn for_day(day: NaiveDate, offset: FixedOffset) -> Self {
        let local_midnight = day.and_time(NaiveTime::MIN);
        let start = (local_midnight - Duration::seconds(i64::from(offset.local_minus_utc())))
            .and_utc();
        Self {
            day,
            start,
            end: start + Duration::days(1),
        }
    }

    pub fn contains(&self, instant: Timestamp) -> bool {
        instant >= self.start && instant < self.end
    }
}

/// Build the canonical offset from a minute count east of UTC.
///
/// Rejects offsets of a full day or more.
pub fn offset_from_minutes(minutes: i32) -> Result<FixedOffset, CoreError> {
    minutes
        .checked_mul(SECS_PER_MINUTE)
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| {
            CoreError::Validation(format!(
                "UTC offset must be strictly between -1440 and 1440 minutes, got {minutes}"
            ))
        })
}
