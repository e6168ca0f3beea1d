//! Work order entity models and DTOs.

use chrono::NaiveDate;
use plowline_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::status::StatusId;

/// A row from the `jobs` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Job {
    pub id: DbId,
    pub contract_id: DbId,
    /// Copied from the contract at creation for query convenience.
    pub customer_id: DbId,
    pub address: String,
    pub scheduled_at: Timestamp,
    pub status_id: StatusId,
    /// The reading that triggered the job.
    pub snowfall_inches: f64,
    pub is_priority: bool,
    pub notes: String,
    /// Day bucket of `created_at`. `None` for manually created jobs.
    pub dispatch_day: Option<NaiveDate>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting an automatically dispatched job.
///
/// `created_at` is supplied by the dispatcher so that it always falls inside
/// `dispatch_day`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDispatchedJob {
    pub contract_id: DbId,
    pub customer_id: DbId,
    pub address: String,
    pub scheduled_at: Timestamp,
    pub status_id: StatusId,
    pub snowfall_inches: f64,
    pub is_priority: bool,
    pub notes: String,
    pub dispatch_day: NaiveDate,
    pub created_at: Timestamp,
}

/// Query parameters for `GET /api/v1/contracts/{id}/jobs`.
#[derive(Debug, Default, Deserialize)]
pub struct JobListQuery {
    /// Maximum number of results. Defaults to 50, capped at 100.
    pub limit: Option<i64>,
    /// Number of results to skip. Defaults to 0.
    pub offset: Option<i64>,
}
