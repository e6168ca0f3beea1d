//! Defaults and validation for dispatch cycle options.
//!
//! Lives in `core` so the server can reject bad environment values with the
//! same rules the dispatcher applies before every cycle.

use std::time::Duration as StdDuration;

use chrono::Duration;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Default gap between job creation and the scheduled visit.
pub const DEFAULT_DISPATCH_LEAD_MINUTES: i64 = 120;

/// Default number of registry operations in flight per cycle.
pub const DEFAULT_CONCURRENCY_LIMIT: usize = 8;

/// Default timeout applied to each registry call and the weather fetch.
pub const DEFAULT_OPERATION_TIMEOUT_SECS: u64 = 10;

/// Upper bound on the concurrency limit.
pub const MAX_CONCURRENCY_LIMIT: usize = 256;

/// Upper bound on the dispatch lead time.
const MAX_DISPATCH_LEAD_HOURS: i64 = 72;

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate the dispatch lead time. Must be in `[0, 72h]`.
pub fn validate_lead_time(lead: Duration) -> Result<(), CoreError> {
    if lead < Duration::zero() {
        return Err(CoreError::Validation(format!(
            "Dispatch lead time must not be negative, got {} minutes",
            lead.num_minutes()
        )));
    }
    if lead > Duration::hours(MAX_DISPATCH_LEAD_HOURS) {
        return Err(CoreError::Validation(format!(
            "Dispatch lead time must not exceed {MAX_DISPATCH_LEAD_HOURS} hours"
        )));
    }
    Ok(())
}

/// Convert a configured minute count into a validated lead time.
///
/// Minute counts too large for a `Duration` are rejected like any other
/// out-of-range lead time.
pub fn lead_time_from_minutes(minutes: i64) -> Result<Duration, CoreError> {
    let lead = Duration::try_minutes(minutes).ok_or_else(|| {
        CoreError::Validation(format!("Dispatch lead time of {minutes} minutes is out of range"))
    })?;
    validate_lead_time(lead)?;
    Ok(lead)
}

/// Validate the concurrency limit. Must be in `[1, MAX_CONCURRENCY_LIMIT]`.
pub fn validate_concurrency_limit(limit: usize) -> Result<(), CoreError> {
    if limit == 0 || limit > MAX_CONCURRENCY_LIMIT {
        return Err(CoreError::Validation(format!(
            "Concurrency limit must be between 1 and {MAX_CONCURRENCY_LIMIT}, got {limit}"
        )));
    }
    Ok(())
}

/// Validate the per-operation timeout. Must be non-zero.
pub fn validate_operation_timeout(timeout: StdDuration) -> Result<(), CoreError> {
    if timeout.is_zero() {
        return Err(CoreError::Validation(
            "Per-operation timeout must be greater than zero".to_string(),
        ));
    }
    Ok(())
}
