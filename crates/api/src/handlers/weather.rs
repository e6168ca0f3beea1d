use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/weather
///
/// Current readings for every monitored city. Responds 503 when the
/// weather source fails or times out. Never creates jobs.
pub async fn current_weather(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let readings = state.dispatcher.weather_snapshot(&state.config.dispatch).await?;
    Ok(Json(DataResponse { data: readings }))
}
