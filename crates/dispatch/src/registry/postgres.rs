//! PostgreSQL-backed registries.
//!
//! Thin adapters over [`ContractRepo`] and [`JobRepo`]. The per-day
//! uniqueness guarantee comes from the `uq_jobs_contract_dispatch_day`
//! index; a conflicting insert returns no row and maps to
//! [`InsertOutcome::Duplicate`].

use async_trait::async_trait;
use plowline_core::types::{DbId, Timestamp};
use plowline_db::models::contract::ServiceContract;
use plowline_db::models::job::{Job, NewDispatchedJob};
use plowline_db::repositories::{ContractRepo, JobRepo};
use plowline_db::DbPool;

use super::{ContractRegistry, InsertOutcome, JobRegistry};
use crate::error::RegistryError;

/// Both registries over one connection pool.
#[derive(Debug, Clone)]
pub struct PgRegistry {
    pool: DbPool,
}

impl PgRegistry {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContractRegistry for PgRegistry {
    async fn find_contracts(
        &self,
        city: &str,
        snowfall_inches: f64,
    ) -> Result<Vec<ServiceContract>, RegistryError> {
        Ok(ContractRepo::find_by_city_within_threshold(&self.pool, city, snowfall_inches).await?)
    }
}

#[async_trait]
impl JobRegistry for PgRegistry {
    async fn find_jobs_for_contract_on_day(
        &self,
        contract_id: DbId,
        day_start: Timestamp,
        day_end: Timestamp,
    ) -> Result<Vec<Job>, RegistryError> {
        Ok(JobRepo::find_for_contract_between(&self.pool, contract_id, day_start, day_end).await?)
    }

    async fn insert_job(&self, job: &NewDispatchedJob) -> Result<InsertOutcome, RegistryError> {
        match JobRepo::insert_dispatched(&self.pool, job).await? {
            Some(row) => Ok(InsertOutcome::Inserted(row.id)),
            None => Ok(InsertOutcome::Duplicate),
        }
    }
}
