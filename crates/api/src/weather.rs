//! Weather source selection.

use std::sync::Arc;

use plowline_core::error::CoreError;
use plowline_dispatch::weather::fixed::StaticWeatherSource;
use plowline_dispatch::weather::openweathermap::OpenWeatherMapSource;
use plowline_dispatch::WeatherSource;

use crate::config::WeatherProvider;

/// Build the weather source named by the configuration. Live sources keep
/// at most `concurrency_limit` requests in flight.
pub fn build_weather_source(
    provider: &WeatherProvider,
    concurrency_limit: usize,
) -> Result<Arc<dyn WeatherSource>, CoreError> {
    match provider {
        WeatherProvider::Static { snowfall } => {
            tracing::info!("Using static weather readings");
            Ok(Arc::new(StaticWeatherSource::parse(snowfall)?))
        }
        WeatherProvider::OpenWeatherMap { api_key } => {
            tracing::info!("Using OpenWeatherMap readings");
            Ok(Arc::new(
                OpenWeatherMapSource::new(api_key.clone())
                    .with_concurrency_limit(concurrency_limit),
            ))
        }
    }
}
