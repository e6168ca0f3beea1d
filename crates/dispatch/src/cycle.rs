//! The dispatch cycle.
//!
//! One cycle moves through `Idle -> Fetching -> Evaluating -> Completed`.
//! Nothing survives between cycles: all dedup state lives in the job
//! registry, so any number of cycles (scheduled or manual) may run at once.
//!
//! Per-city contract queries and per-contract dedup/insert units fan out
//! concurrently, bounded by [`DispatchConfig::concurrency_limit`]. Each
//! contract's outcome is independent of every other, so the tally does not
//! depend on completion order.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use plowline_core::day_bucket::DayWindow;
use plowline_core::types::{DbId, Timestamp};
use plowline_core::weather::{validate_reading, CityWeatherReading};
use plowline_db::models::contract::ServiceContract;
use serde::Serialize;

use crate::config::DispatchConfig;
use crate::error::{DispatchError, FetchError};
use crate::registry::{ContractRegistry, InsertOutcome, JobRegistry};
use crate::weather::WeatherSource;
use crate::{dedup, evaluator, materializer};

// ---------------------------------------------------------------------------
// Result accounting
// ---------------------------------------------------------------------------

/// Aggregate outcome of one dispatch cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchResult {
    /// Jobs written by this cycle.
    pub created: usize,
    /// Contracts that already had a job for the day, including inserts that
    /// lost a race to a concurrent cycle.
    pub skipped: usize,
    /// Contract lookups, dedup checks or inserts that failed or timed out.
    pub errors: usize,
}

impl DispatchResult {
    fn record(&mut self, outcome: ContractOutcome) {
        match outcome {
            ContractOutcome::Created(_) => self.created += 1,
            ContractOutcome::AlreadyDispatched => self.skipped += 1,
            ContractOutcome::Failed => self.errors += 1,
        }
    }
}

/// What happened to one matched contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContractOutcome {
    Created(DbId),
    AlreadyDispatched,
    Failed,
}

/// Lifecycle of a single cycle, recorded in trace output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CycleState {
    Idle,
    Fetching,
    Evaluating,
    Completed,
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Runs dispatch cycles against a weather source and two registries.
///
/// Cheap to share behind an `Arc`; it holds no per-cycle state.
pub struct Dispatcher {
    weather: Arc<dyn WeatherSource>,
    contracts: Arc<dyn ContractRegistry>,
    jobs: Arc<dyn JobRegistry>,
}

impl Dispatcher {
    pub fn new(
        weather: Arc<dyn WeatherSource>,
        contracts: Arc<dyn ContractRegistry>,
        jobs: Arc<dyn JobRegistry>,
    ) -> Self {
        Self {
            weather,
            contracts,
            jobs,
        }
    }

    /// Current readings for the configured cities, for display.
    ///
    /// Shares the weather source with the dispatch cycle and applies the
    /// same fetch timeout. Never touches the registries.
    pub async fn weather_snapshot(
        &self,
        config: &DispatchConfig,
    ) -> Result<Vec<CityWeatherReading>, DispatchError> {
        config.validate().map_err(DispatchError::Configuration)?;
        Ok(self.fetch(config).await?)
    }

    /// Run one dispatch cycle now.
    pub async fn run_cycle(
        &self,
        config: &DispatchConfig,
    ) -> Result<DispatchResult, DispatchError> {
        self.run_cycle_at(config, Utc::now()).await
    }

    /// Run one dispatch cycle as if the current time were `now`.
    ///
    /// `now` picks the day bucket and becomes `created_at` on new jobs.
    ///
    /// # Errors
    ///
    /// Fails only when the configuration is invalid or the weather fetch
    /// fails; in both cases no registry call is made. Every per-contract
    /// failure is counted in [`DispatchResult::errors`] instead.
    pub async fn run_cycle_at(
        &self,
        config: &DispatchConfig,
        now: Timestamp,
    ) -> Result<DispatchResult, DispatchError> {
        let mut state = CycleState::Idle;
        config.validate().map_err(DispatchError::Configuration)?;

        advance(&mut state, CycleState::Fetching);
        let readings = match self.fetch(config).await {
            Ok(readings) => readings,
            Err(e) => {
                tracing::error!(error = %e, "Dispatch cycle aborted: weather unavailable");
                return Err(e.into());
            }
        };

        advance(&mut state, CycleState::Evaluating);
        let window = DayWindow::containing(now, config.day_offset);
        let triggering = triggering_readings(readings);
        let mut result = DispatchResult::default();

        let matched: Vec<_> = stream::iter(triggering)
            .map(|reading| async move {
                let found = evaluator::matching_contracts(
                    self.contracts.as_ref(),
                    &reading,
                    config.per_operation_timeout,
                )
                .await;
                (reading, found)
            })
            .buffer_unordered(config.concurrency_limit)
            .collect()
            .await;

        let mut candidates: Vec<(ServiceContract, Arc<CityWeatherReading>)> = Vec::new();
        for (reading, found) in matched {
            match found {
                Ok(contracts) => {
                    let reading = Arc::new(reading);
                    candidates.extend(contracts.into_iter().map(|c| (c, Arc::clone(&reading))));
                }
                Err(e) => {
                    // The city's contracts are unknown, so count one error.
                    tracing::warn!(city = %reading.city, error = %e, "Contract lookup failed");
                    result.errors += 1;
                }
            }
        }

        let outcomes: Vec<ContractOutcome> = stream::iter(candidates)
            .map(|(contract, reading)| {
                self.dispatch_contract(config, contract, reading, now, window)
            })
            .buffer_unordered(config.concurrency_limit)
            .collect()
            .await;

        for outcome in outcomes {
            result.record(outcome);
        }

        advance(&mut state, CycleState::Completed);
        tracing::info!(
            day = %window.day,
            created = result.created,
            skipped = result.skipped,
            errors = result.errors,
            "Dispatch cycle completed"
        );
        Ok(result)
    }

    async fn fetch(&self, config: &DispatchConfig) -> Result<Vec<CityWeatherReading>, FetchError> {
        tokio::time::timeout(
            config.per_operation_timeout,
            self.weather.fetch_current(&config.cities),
        )
        .await
        .map_err(|_| FetchError::Timeout)?
    }

    /// Dedup check, then insert, for one contract. Never fails the cycle.
    ///
    /// A failed dedup check counts as an error and the contract gets no job
    /// this cycle. The next cycle retries it.
    async fn dispatch_contract(
        &self,
        config: &DispatchConfig,
        contract: ServiceContract,
        reading: Arc<CityWeatherReading>,
        now: Timestamp,
        window: DayWindow,
    ) -> ContractOutcome {
        let timeout = config.per_operation_timeout;

        match dedup::already_dispatched(self.jobs.as_ref(), contract.id, &window, timeout).await {
            Ok(true) => {
                tracing::debug!(contract_id = contract.id, "Job already dispatched today");
                return ContractOutcome::AlreadyDispatched;
            }
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(contract_id = contract.id, error = %e, "Dedup check failed");
                return ContractOutcome::Failed;
            }
        }

        let job = materializer::build_job(
            &contract,
            &reading,
            now,
            config.dispatch_lead_time,
            &window,
        );

        match materializer::materialize(self.jobs.as_ref(), &job, timeout).await {
            Ok(InsertOutcome::Inserted(job_id)) => {
                tracing::info!(
                    job_id,
                    contract_id = contract.id,
                    snowfall_inches = reading.snowfall_inches,
                    threshold_inches = contract.snow_threshold_inches,
                    is_priority = contract.is_priority,
                    "Job dispatched"
                );
                ContractOutcome::Created(job_id)
            }
            Ok(InsertOutcome::Duplicate) => {
                tracing::debug!(
                    contract_id = contract.id,
                    "Concurrent cycle already dispatched this contract"
                );
                ContractOutcome::AlreadyDispatched
            }
            Err(e) => {
                tracing::error!(contract_id = contract.id, error = %e, "Failed to create job");
                ContractOutcome::Failed
            }
        }
    }
}

fn advance(state: &mut CycleState, next: CycleState) {
    tracing::trace!(from = ?*state, to = ?next, "Dispatch cycle state");
    *state = next;
}

/// Valid readings with snowfall, one per city.
///
/// Invalid readings are dropped with a warning. If the source reports a
/// city twice, the larger snowfall wins.
fn triggering_readings(readings: Vec<CityWeatherReading>) -> Vec<CityWeatherReading> {
    let mut by_city: HashMap<String, CityWeatherReading> = HashMap::new();
    for reading in readings {
        if let Err(e) = validate_reading(&reading) {
            tracing::warn!(city = %reading.city, error = %e, "Discarding weather reading");
            continue;
        }
        if !reading.has_snowfall() {
            continue;
        }
        match by_city.get(&reading.city) {
            Some(existing) if existing.snowfall_inches >= reading.snowfall_inches => {}
            _ => {
                by_city.insert(reading.city.clone(), reading);
            }
        }
    }
    by_city.into_values().collect()
}
