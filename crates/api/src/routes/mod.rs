pub mod contracts;
pub mod dispatch;
pub mod health;
pub mod weather;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /weather                      current readings for monitored cities (GET)
/// /dispatch/run                 run one dispatch cycle now (POST)
/// /contracts/{id}/jobs          jobs created for a contract (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/weather", weather::router())
        .nest("/dispatch", dispatch::router())
        .nest("/contracts", contracts::router())
}
