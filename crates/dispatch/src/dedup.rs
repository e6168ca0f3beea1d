//! Per-day deduplication check.
//!
//! The key is the calendar day, not time since the last job: several snow
//! events on one day yield one job, and a new day always re-arms the
//! contract. This read alone does not close the check-then-insert race; the
//! job registry's uniqueness constraint does.

use std::time::Duration;

use plowline_core::day_bucket::DayWindow;
use plowline_core::types::DbId;

use crate::error::RegistryError;
use crate::registry::JobRegistry;

/// Whether `contract_id` already has a job created inside `window`.
pub async fn already_dispatched(
    registry: &dyn JobRegistry,
    contract_id: DbId,
    window: &DayWindow,
    timeout: Duration,
) -> Result<bool, RegistryError> {
    let jobs = tokio::time::timeout(
        timeout,
        registry.find_jobs_for_contract_on_day(contract_id, window.start, window.end),
    )
    .await
    .map_err(|_| RegistryError::Timeout)??;

    Ok(!jobs.is_empty())
}
