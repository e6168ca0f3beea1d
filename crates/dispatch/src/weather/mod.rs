//! Weather reading sources.
//!
//! The dispatcher treats the source as an untrusted, possibly failing
//! oracle behind the [`WeatherSource`] capability:
//!
//! - [`fixed::StaticWeatherSource`]: configured readings, for development
//!   and deterministic tests.
//! - [`openweathermap::OpenWeatherMapSource`]: live current conditions.

pub mod fixed;
pub mod openweathermap;

use async_trait::async_trait;
use plowline_core::weather::{CityWeatherReading, MonitoredCity};

use crate::error::FetchError;

/// Supplies current readings for a list of cities.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    /// Fetch one reading per city. Any failure fails the whole fetch.
    async fn fetch_current(
        &self,
        cities: &[MonitoredCity],
    ) -> Result<Vec<CityWeatherReading>, FetchError>;
}
