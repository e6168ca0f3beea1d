//! Threshold evaluation: which contracts does a reading trigger?

use std::time::Duration;

use plowline_core::thresholds::threshold_met;
use plowline_core::weather::CityWeatherReading;
use plowline_db::models::contract::ServiceContract;

use crate::error::RegistryError;
use crate::registry::ContractRegistry;

/// Contracts in the reading's city whose threshold the reading meets.
///
/// A zero reading returns nothing without querying the registry. Registry
/// results are re-checked here, so the inclusive-threshold and same-city
/// rules hold whatever filtering the registry applied. Priority is carried
/// on each contract but never used to filter.
pub async fn matching_contracts(
    registry: &dyn ContractRegistry,
    reading: &CityWeatherReading,
    timeout: Duration,
) -> Result<Vec<ServiceContract>, RegistryError> {
    if !reading.has_snowfall() {
        return Ok(Vec::new());
    }

    let candidates = tokio::time::timeout(
        timeout,
        registry.find_contracts(&reading.city, reading.snowfall_inches),
    )
    .await
    .map_err(|_| RegistryError::Timeout)??;

    Ok(candidates
        .into_iter()
        .filter(|c| {
            c.city == reading.city
                && threshold_met(c.snow_threshold_inches, reading.snowfall_inches)
        })
        .collect())
}
