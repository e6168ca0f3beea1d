use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use plowline_core::error::CoreError;
use plowline_core::types::DbId;
use plowline_db::models::job::JobListQuery;
use plowline_db::repositories::{ContractRepo, JobRepo};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/contracts/{id}/jobs
///
/// Jobs for one contract, newest first. Supports `limit` (default 50,
/// max 100) and `offset`.
pub async fn list_contract_jobs(
    State(state): State<AppState>,
    Path(contract_id): Path<DbId>,
    Query(params): Query<JobListQuery>,
) -> AppResult<impl IntoResponse> {
    ContractRepo::find_by_id(&state.pool, contract_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "ServiceContract",
            id: contract_id,
        }))?;

    let jobs = JobRepo::list_for_contract(&state.pool, contract_id, &params).await?;
    Ok(Json(DataResponse { data: jobs }))
}
