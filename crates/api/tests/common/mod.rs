#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use plowline_core::weather::MonitoredCity;
use plowline_dispatch::registry::postgres::PgRegistry;
use plowline_dispatch::weather::fixed::StaticWeatherSource;
use plowline_dispatch::{DispatchConfig, Dispatcher};
use sqlx::PgPool;
use tower::ServiceExt;

use plowline_api::config::{ServerConfig, WeatherProvider};
use plowline_api::router::build_app_router;
use plowline_api::state::AppState;

/// A `ServerConfig` monitoring `City 1` and `City 2`, scheduler disabled.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        dispatch: DispatchConfig::for_cities(vec![
            MonitoredCity::new("City 1", 42.36, -71.06),
            MonitoredCity::new("City 2", 39.74, -104.99),
        ]),
        dispatch_interval: Duration::ZERO,
        weather: WeatherProvider::Static {
            snowfall: String::new(),
        },
    }
}

/// Build the full application router over `pool`, reading weather from
/// `weather`. Tests keep the `Arc` to change readings between requests.
pub fn build_test_app(pool: PgPool, weather: Arc<StaticWeatherSource>) -> Router {
    let config = test_config();
    let registry = Arc::new(PgRegistry::new(pool.clone()));
    let dispatcher = Arc::new(Dispatcher::new(weather, registry.clone(), registry));

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        dispatcher,
    };

    build_app_router(state, &config)
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri).await
}

pub async fn post(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::POST, uri).await
}

async fn send(app: Router, method: Method, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
