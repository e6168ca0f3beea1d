//! Read-only contract views. Contracts themselves are managed elsewhere.

use axum::routing::get;
use axum::Router;

use crate::handlers::contracts;
use crate::state::AppState;

/// Routes mounted at `/contracts`.
///
/// ```text
/// GET    /{id}/jobs       -> list_contract_jobs
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/{id}/jobs", get(contracts::list_contract_jobs))
}
