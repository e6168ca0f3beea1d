//! Service contract entity and DTOs.
//!
//! Contracts are owned by the contract registry. The dispatcher reads them
//! and never mutates them.

use plowline_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `service_contracts` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct ServiceContract {
    pub id: DbId,
    pub customer_id: DbId,
    pub address: String,
    pub city: String,
    pub snow_threshold_inches: f64,
    pub is_priority: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting a new contract.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateServiceContract {
    pub customer_id: DbId,
    pub address: String,
    pub city: String,
    pub snow_threshold_inches: f64,
    pub is_priority: Option<bool>,
}
