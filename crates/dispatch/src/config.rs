//! Options for a dispatch cycle.

use std::time::Duration as StdDuration;

use chrono::{Duration, FixedOffset, Offset, Utc};
use plowline_core::dispatch_options::{
    validate_concurrency_limit, validate_lead_time, validate_operation_timeout,
    DEFAULT_CONCURRENCY_LIMIT, DEFAULT_DISPATCH_LEAD_MINUTES, DEFAULT_OPERATION_TIMEOUT_SECS,
};
use plowline_core::error::CoreError;
use plowline_core::weather::{default_monitored_cities, validate_cities, MonitoredCity};

/// Everything one dispatch cycle needs besides its collaborators.
///
/// The monitored city list is part of the configuration; nothing about it is
/// held in process-wide state.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Cities to fetch readings for.
    pub cities: Vec<MonitoredCity>,
    /// Gap between job creation and `scheduled_at` (default: 2 hours).
    pub dispatch_lead_time: Duration,
    /// Maximum registry operations in flight at once (default: 8).
    pub concurrency_limit: usize,
    /// Timeout for each registry call and for the weather fetch (default: 10s).
    pub per_operation_timeout: StdDuration,
    /// Canonical zone for day buckets (default: UTC).
    pub day_offset: FixedOffset,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            cities: default_monitored_cities(),
            dispatch_lead_time: Duration::minutes(DEFAULT_DISPATCH_LEAD_MINUTES),
            concurrency_limit: DEFAULT_CONCURRENCY_LIMIT,
            per_operation_timeout: StdDuration::from_secs(DEFAULT_OPERATION_TIMEOUT_SECS),
            day_offset: Utc.fix(),
        }
    }
}

impl DispatchConfig {
    /// Default options with the given city list.
    pub fn for_cities(cities: Vec<MonitoredCity>) -> Self {
        Self {
            cities,
            ..Self::default()
        }
    }

    /// Pre-flight check run before every cycle.
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_lead_time(self.dispatch_lead_time)?;
        validate_concurrency_limit(self.concurrency_limit)?;
        validate_operation_timeout(self.per_operation_timeout)?;
        validate_cities(&self.cities)?;
        Ok(())
    }
}
