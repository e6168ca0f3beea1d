use axum::routing::get;
use axum::Router;

use crate::handlers::weather;
use crate::state::AppState;

/// Routes mounted at `/weather`.
///
/// ```text
/// GET    /                -> current_weather
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(weather::current_weather))
}
