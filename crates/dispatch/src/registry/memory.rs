//! In-memory registries for testing and local development.
//!
//! ## Limitations
//!
//! - **NOT suitable for production**: No durability, no cross-process coordination
//! - **Single-process only**: State is not shared across process boundaries
//!
//! The job registry enforces the same `(contract_id, dispatch_day)`
//! uniqueness rule as the database, under its lock. Both registries support
//! failure injection so tests can exercise per-contract error isolation.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use plowline_core::thresholds::threshold_met;
use plowline_core::types::{DbId, Timestamp};
use plowline_db::models::contract::ServiceContract;
use plowline_db::models::job::{Job, NewDispatchedJob};

use super::{ContractRegistry, InsertOutcome, JobRegistry};
use crate::error::RegistryError;

/// Converts a lock poison error to a storage error.
fn poison_err<T>(_: PoisonError<T>) -> RegistryError {
    RegistryError::Storage("lock poisoned".to_string())
}

// ---------------------------------------------------------------------------
// Contracts
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct ContractState {
    contracts: Vec<ServiceContract>,
    failing_cities: HashSet<String>,
}

/// In-memory contract registry.
#[derive(Debug, Default)]
pub struct InMemoryContractRegistry {
    state: Mutex<ContractState>,
}

impl InMemoryContractRegistry {
    pub fn new(contracts: Vec<ServiceContract>) -> Self {
        Self {
            state: Mutex::new(ContractState {
                contracts,
                failing_cities: HashSet::new(),
            }),
        }
    }

    /// Make every lookup for `city` fail until further notice.
    pub fn fail_lookups_for_city(&self, city: &str) -> Result<(), RegistryError> {
        self.state
            .lock()
            .map_err(poison_err)?
            .failing_cities
            .insert(city.to_string());
        Ok(())
    }
}

#[async_trait]
impl ContractRegistry for InMemoryContractRegistry {
    async fn find_contracts(
        &self,
        city: &str,
        snowfall_inches: f64,
    ) -> Result<Vec<ServiceContract>, RegistryError> {
        let state = self.state.lock().map_err(poison_err)?;
        if state.failing_cities.contains(city) {
            return Err(RegistryError::Storage(format!(
                "injected contract lookup failure for {city}"
            )));
        }
        Ok(state
            .contracts
            .iter()
            .filter(|c| c.city == city && threshold_met(c.snow_threshold_inches, snowfall_inches))
            .cloned()
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Jobs
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct JobState {
    jobs: Vec<Job>,
    next_id: DbId,
    failing_inserts: HashSet<DbId>,
    failing_lookups: HashSet<DbId>,
}

/// In-memory job registry.
#[derive(Debug, Default)]
pub struct InMemoryJobRegistry {
    state: Mutex<JobState>,
    /// Pause between reading a day's jobs and returning them. Widens the
    /// check-then-insert gap so race tests can overlap two cycles reliably.
    lookup_delay: Option<Duration>,
}

impl InMemoryJobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry whose day lookups pause for `delay` after reading.
    pub fn with_lookup_delay(delay: Duration) -> Self {
        Self {
            lookup_delay: Some(delay),
            ..Self::default()
        }
    }

    /// Make inserts for `contract_id` fail with a storage error.
    pub fn fail_inserts_for(&self, contract_id: DbId) -> Result<(), RegistryError> {
        self.state
            .lock()
            .map_err(poison_err)?
            .failing_inserts
            .insert(contract_id);
        Ok(())
    }

    /// Make day lookups for `contract_id` fail with a storage error.
    pub fn fail_lookups_for(&self, contract_id: DbId) -> Result<(), RegistryError> {
        self.state
            .lock()
            .map_err(poison_err)?
            .failing_lookups
            .insert(contract_id);
        Ok(())
    }

    /// Snapshot of every stored job, in insertion order.
    pub fn jobs(&self) -> Result<Vec<Job>, RegistryError> {
        Ok(self.state.lock().map_err(poison_err)?.jobs.clone())
    }

    /// Jobs stored for one contract.
    pub fn jobs_for_contract(&self, contract_id: DbId) -> Result<Vec<Job>, RegistryError> {
        let state = self.state.lock().map_err(poison_err)?;
        Ok(state
            .jobs
            .iter()
            .filter(|j| j.contract_id == contract_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl JobRegistry for InMemoryJobRegistry {
    async fn find_jobs_for_contract_on_day(
        &self,
        contract_id: DbId,
        day_start: Timestamp,
        day_end: Timestamp,
    ) -> Result<Vec<Job>, RegistryError> {
        let found = {
            let state = self.state.lock().map_err(poison_err)?;
            if state.failing_lookups.contains(&contract_id) {
                return Err(RegistryError::Storage(format!(
                    "injected job lookup failure for contract {contract_id}"
                )));
            }
            state
                .jobs
                .iter()
                .filter(|j| {
                    j.contract_id == contract_id
                        && j.created_at >= day_start
                        && j.created_at < day_end
                })
                .cloned()
                .collect::<Vec<_>>()
        };

        if let Some(delay) = self.lookup_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(found)
    }

    async fn insert_job(&self, job: &NewDispatchedJob) -> Result<InsertOutcome, RegistryError> {
        let mut state = self.state.lock().map_err(poison_err)?;

        if state.failing_inserts.contains(&job.contract_id) {
            return Err(RegistryError::Storage(format!(
                "injected insert failure for contract {}",
                job.contract_id
            )));
        }

        let taken = state
            .jobs
            .iter()
            .any(|j| j.contract_id == job.contract_id && j.dispatch_day == Some(job.dispatch_day));
        if taken {
            return Ok(InsertOutcome::Duplicate);
        }

        state.next_id += 1;
        let id = state.next_id;
        state.jobs.push(Job {
            id,
            contract_id: job.contract_id,
            customer_id: job.customer_id,
            address: job.address.clone(),
            scheduled_at: job.scheduled_at,
            status_id: job.status_id,
            snowfall_inches: job.snowfall_inches,
            is_priority: job.is_priority,
            notes: job.notes.clone(),
            dispatch_day: Some(job.dispatch_day),
            created_at: job.created_at,
            updated_at: job.created_at,
        });
        Ok(InsertOutcome::Inserted(id))
    }
}
