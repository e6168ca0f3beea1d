//! Repository for the `jobs` table.
//!
//! Only the operations the dispatcher and the read-only job listing need.
//! Status transitions after creation belong to other services.

use plowline_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::job::{Job, JobListQuery, NewDispatchedJob};

/// Column list for `jobs` queries.
const COLUMNS: &str = "\
    id, contract_id, customer_id, address, scheduled_at, status_id, \
    snowfall_inches, is_priority, notes, dispatch_day, \
    created_at, updated_at";

/// Maximum page size for job listing.
const MAX_LIMIT: i64 = 100;

/// Default page size for job listing.
const DEFAULT_LIMIT: i64 = 50;

/// Provides queries and inserts for work orders.
pub struct JobRepo;

impl JobRepo {
    /// Insert an automatically dispatched job.
    ///
    /// Returns `None` when another job already holds the
    /// `(contract_id, dispatch_day)` slot. The insert is guarded by the
    /// `uq_jobs_contract_dispatch_day` index, so two racing dispatchers can
    /// never both succeed.
    pub async fn insert_dispatched(
        pool: &PgPool,
        input: &NewDispatchedJob,
    ) -> Result<Option<Job>, sqlx::Error> {
        let query = format!(
            "INSERT INTO jobs (contract_id, customer_id, address, scheduled_at, status_id, \
                               snowfall_inches, is_priority, notes, dispatch_day, \
                               created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10) \
             ON CONFLICT (contract_id, dispatch_day) WHERE dispatch_day IS NOT NULL DO NOTHING \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(input.contract_id)
            .bind(input.customer_id)
            .bind(&input.address)
            .bind(input.scheduled_at)
            .bind(input.status_id)
            .bind(input.snowfall_inches)
            .bind(input.is_priority)
            .bind(&input.notes)
            .bind(input.dispatch_day)
            .bind(input.created_at)
            .fetch_optional(pool)
            .await
    }

    /// Jobs for a contract with `created_at` in `[start, end)`.
    pub async fn find_for_contract_between(
        pool: &PgPool,
        contract_id: DbId,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<Vec<Job>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM jobs \
             WHERE contract_id = $1 AND created_at >= $2 AND created_at < $3 \
             ORDER BY created_at ASC"
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(contract_id)
            .bind(start)
            .bind(end)
            .fetch_all(pool)
            .await
    }

    /// List jobs for a contract, newest first.
    pub async fn list_for_contract(
        pool: &PgPool,
        contract_id: DbId,
        params: &JobListQuery,
    ) -> Result<Vec<Job>, sqlx::Error> {
        let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let offset = params.offset.unwrap_or(0).max(0);
        let query = format!(
            "SELECT {COLUMNS} FROM jobs \
             WHERE contract_id = $1 \
             ORDER BY created_at DESC, id DESC \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(contract_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }
}
