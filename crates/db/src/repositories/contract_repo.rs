//! Repository for the `service_contracts` table.

use plowline_core::types::DbId;
use sqlx::PgPool;

use crate::models::contract::{CreateServiceContract, ServiceContract};

/// Column list for `service_contracts` queries.
const COLUMNS: &str = "\
    id, customer_id, address, city, snow_threshold_inches, is_priority, \
    created_at, updated_at";

/// Provides read access (and inserts for seeding) on service contracts.
pub struct ContractRepo;

impl ContractRepo {
    /// Insert a new contract.
    pub async fn create(
        pool: &PgPool,
        input: &CreateServiceContract,
    ) -> Result<ServiceContract, sqlx::Error> {
        let query = format!(
            "INSERT INTO service_contracts \
                (customer_id, address, city, snow_threshold_inches, is_priority) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ServiceContract>(&query)
            .bind(input.customer_id)
            .bind(&input.address)
            .bind(&input.city)
            .bind(input.snow_threshold_inches)
            .bind(input.is_priority.unwrap_or(false))
            .fetch_one(pool)
            .await
    }

    /// Find a contract by its ID.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<ServiceContract>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM service_contracts WHERE id = $1");
        sqlx::query_as::<_, ServiceContract>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Contracts in `city` whose threshold is at or below `snowfall_inches`.
    ///
    /// Priority contracts come first; otherwise ordered by ID.
    pub async fn find_by_city_within_threshold(
        pool: &PgPool,
        city: &str,
        snowfall_inches: f64,
    ) -> Result<Vec<ServiceContract>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM service_contracts \
             WHERE city = $1 AND snow_threshold_inches <= $2 \
             ORDER BY is_priority DESC, id ASC"
        );
        sqlx::query_as::<_, ServiceContract>(&query)
            .bind(city)
            .bind(snowfall_inches)
            .fetch_all(pool)
            .await
    }
}
