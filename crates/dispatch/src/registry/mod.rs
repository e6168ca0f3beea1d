//! Collaborator registries the dispatcher depends on.
//!
//! The contract registry is read-only from the dispatcher's point of view.
//! The job registry is the only shared mutable resource; implementations of
//! [`JobRegistry::insert_job`] must enforce at most one automatic job per
//! `(contract_id, dispatch_day)` and report a violation as
//! [`InsertOutcome::Duplicate`] rather than an error.
//!
//! - [`memory`]: in-process registries for tests and development.
//! - [`postgres`]: registries backed by `plowline_db` repositories.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use plowline_core::types::{DbId, Timestamp};
use plowline_db::models::contract::ServiceContract;
use plowline_db::models::job::{Job, NewDispatchedJob};

use crate::error::RegistryError;

/// Result of an automatic job insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new job row was written.
    Inserted(DbId),
    /// The contract already has a job for this day bucket. Nothing was written.
    Duplicate,
}

/// Read access to service contracts.
#[async_trait]
pub trait ContractRegistry: Send + Sync {
    /// Contracts in `city` whose threshold is at or below `snowfall_inches`.
    async fn find_contracts(
        &self,
        city: &str,
        snowfall_inches: f64,
    ) -> Result<Vec<ServiceContract>, RegistryError>;
}

/// Job lookup and insertion.
#[async_trait]
pub trait JobRegistry: Send + Sync {
    /// Jobs for `contract_id` with `created_at` in `[day_start, day_end)`.
    async fn find_jobs_for_contract_on_day(
        &self,
        contract_id: DbId,
        day_start: Timestamp,
        day_end: Timestamp,
    ) -> Result<Vec<Job>, RegistryError>;

    /// Insert an automatic job, enforcing the per-day uniqueness constraint.
    async fn insert_job(&self, job: &NewDispatchedJob) -> Result<InsertOutcome, RegistryError>;
}
