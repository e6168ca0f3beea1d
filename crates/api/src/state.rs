use std::sync::Arc;

use plowline_dispatch::Dispatcher;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything is behind an `Arc` or is a pool handle.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: plowline_db::DbPool,
    /// Server configuration, including the dispatch options.
    pub config: Arc<ServerConfig>,
    /// Dispatcher shared by manual triggers and the background scheduler.
    pub dispatcher: Arc<Dispatcher>,
}
