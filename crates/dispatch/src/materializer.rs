//! Builds and persists automatic work orders.

use std::time::Duration as StdDuration;

use chrono::Duration;
use plowline_core::day_bucket::DayWindow;
use plowline_core::types::Timestamp;
use plowline_core::weather::CityWeatherReading;
use plowline_core::work_order::{dispatch_notes, scheduled_at, service_address};
use plowline_db::models::contract::ServiceContract;
use plowline_db::models::job::NewDispatchedJob;
use plowline_db::models::status::JobStatus;

use crate::error::RegistryError;
use crate::registry::{InsertOutcome, JobRegistry};

/// The job record for `contract`, triggered by `reading` at `now`.
///
/// `now` must fall inside `window`; it becomes both `created_at` and
/// `updated_at`, and `window.day` becomes the uniqueness key.
pub fn build_job(
    contract: &ServiceContract,
    reading: &CityWeatherReading,
    now: Timestamp,
    lead: Duration,
    window: &DayWindow,
) -> NewDispatchedJob {
    debug_assert!(window.contains(now));
    NewDispatchedJob {
        contract_id: contract.id,
        customer_id: contract.customer_id,
        address: service_address(&contract.address, &contract.city),
        scheduled_at: scheduled_at(now, lead),
        status_id: JobStatus::Pending.id(),
        snowfall_inches: reading.snowfall_inches,
        is_priority: contract.is_priority,
        notes: dispatch_notes(reading.snowfall_inches, contract.snow_threshold_inches),
        dispatch_day: window.day,
        created_at: now,
    }
}

/// Insert `job` with a single registry write.
pub async fn materialize(
    registry: &dyn JobRegistry,
    job: &NewDispatchedJob,
    timeout: StdDuration,
) -> Result<InsertOutcome, RegistryError> {
    tokio::time::timeout(timeout, registry.insert_job(job))
        .await
        .map_err(|_| RegistryError::Timeout)?
}
