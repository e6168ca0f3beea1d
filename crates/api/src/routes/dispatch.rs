use axum::routing::post;
use axum::Router;

use crate::handlers::dispatch;
use crate::state::AppState;

/// Routes mounted at `/dispatch`.
///
/// ```text
/// POST   /run             -> run_dispatch
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/run", post(dispatch::run_dispatch))
}
