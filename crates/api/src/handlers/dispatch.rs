use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/dispatch/run
///
/// Run one dispatch cycle now and return its `{ created, skipped, errors }`
/// tally. Safe to call while the scheduler is running a cycle. Responds 503
/// when the weather fetch fails, in which case nothing was written.
pub async fn run_dispatch(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let result = state.dispatcher.run_cycle(&state.config.dispatch).await?;

    tracing::info!(
        created = result.created,
        skipped = result.skipped,
        errors = result.errors,
        "Manual dispatch cycle finished",
    );

    Ok(Json(DataResponse { data: result }))
}
