//! Current conditions from the OpenWeatherMap API.
//!
//! Queries `data/2.5/weather` once per city in imperial units, with at most
//! `concurrency_limit` requests in flight. Snow depth is reported in
//! millimetres over the last hour and is converted to inches; a response
//! without a `snow` block means no snow.

use std::future::Future;

use async_trait::async_trait;
use chrono::Utc;
use futures::future::BoxFuture;
use futures::{stream, FutureExt, StreamExt, TryStreamExt};
use plowline_core::dispatch_options::DEFAULT_CONCURRENCY_LIMIT;
use plowline_core::weather::{millimetres_to_inches, CityWeatherReading, MonitoredCity};
use serde::Deserialize;

use super::WeatherSource;
use crate::error::FetchError;

/// Default endpoint for current conditions.
pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

// ---------------------------------------------------------------------------
// Response shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct CurrentConditions {
    main: Option<MainBlock>,
    snow: Option<SnowBlock>,
}

#[derive(Debug, Deserialize)]
struct MainBlock {
    temp: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct SnowBlock {
    #[serde(rename = "1h")]
    last_hour_mm: Option<f64>,
    #[serde(rename = "3h")]
    last_three_hours_mm: Option<f64>,
}

impl CurrentConditions {
    fn into_reading(self, city: &MonitoredCity) -> CityWeatherReading {
        let snow_mm = self
            .snow
            .and_then(|s| s.last_hour_mm.or(s.last_three_hours_mm))
            .unwrap_or(0.0);
        CityWeatherReading {
            city: city.name.clone(),
            snowfall_inches: millimetres_to_inches(snow_mm),
            temperature_f: self.main.and_then(|m| m.temp),
            captured_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

/// Live weather source. Cheap to clone; the HTTP client is shared.
#[derive(Debug, Clone)]
pub struct OpenWeatherMapSource {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    concurrency_limit: usize,
}

impl OpenWeatherMapSource {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Point at a different endpoint (a proxy or a local stub server).
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into(),
            concurrency_limit: DEFAULT_CONCURRENCY_LIMIT,
        }
    }

    /// Cap the number of city requests in flight. Zero is treated as one.
    pub fn with_concurrency_limit(mut self, limit: usize) -> Self {
        self.concurrency_limit = limit.max(1);
        self
    }

    async fn fetch_city(&self, city: &MonitoredCity) -> Result<CityWeatherReading, FetchError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("lat", city.latitude.to_string()),
                ("lon", city.longitude.to_string()),
                ("units", "imperial".to_string()),
                ("appid", self.api_key.clone()),
            ])
            .send()
            .await
            .map_err(|e| FetchError::Unavailable(format!("{}: {e}", city.name)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Unavailable(format!(
                "{}: HTTP {status}",
                city.name
            )));
        }

        let conditions: CurrentConditions = response
            .json()
            .await
            .map_err(|e| FetchError::InvalidResponse(format!("{}: {e}", city.name)))?;

        Ok(conditions.into_reading(city))
    }
}

#[async_trait]
impl WeatherSource for OpenWeatherMapSource {
    async fn fetch_current(
        &self,
        cities: &[MonitoredCity],
    ) -> Result<Vec<CityWeatherReading>, FetchError> {
        let readings =
            fetch_bounded(cities, self.concurrency_limit, |city| self.fetch_city(city)).await?;
        tracing::debug!(count = readings.len(), "Fetched current weather");
        Ok(readings)
    }
}

/// Run `fetch` for every city, at most `limit` at a time, keeping city order.
/// The first failure aborts the whole fetch.
fn fetch_bounded<'a, F, Fut>(
    cities: &'a [MonitoredCity],
    limit: usize,
    fetch: F,
) -> BoxFuture<'a, Result<Vec<CityWeatherReading>, FetchError>>
where
    F: FnMut(&'a MonitoredCity) -> Fut + Send + 'a,
    Fut: Future<Output = Result<CityWeatherReading, FetchError>> + Send + 'a,
{
    stream::iter(cities)
        .map(fetch)
        .buffered(limit.max(1))
        .try_collect()
        .boxed()
}
