//! A weather source that reports configured snowfall values.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use plowline_core::error::CoreError;
use plowline_core::weather::{CityWeatherReading, MonitoredCity};

use super::WeatherSource;
use crate::error::FetchError;

fn poison_err<T>(_: PoisonError<T>) -> FetchError {
    FetchError::Unavailable("lock poisoned".to_string())
}

#[derive(Debug, Default)]
struct Conditions {
    snowfall: HashMap<String, f64>,
    failure: Option<String>,
}

/// Reports a fixed snowfall per city. Cities without a value report zero.
///
/// Values can be changed between cycles, and the source can be switched
/// into a failing state to simulate an outage.
#[derive(Debug, Default)]
pub struct StaticWeatherSource {
    conditions: Mutex<Conditions>,
    delay: Option<Duration>,
}

impl StaticWeatherSource {
    pub fn new<I, S>(snowfall: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        Self {
            conditions: Mutex::new(Conditions {
                snowfall: snowfall.into_iter().map(|(c, s)| (c.into(), s)).collect(),
                failure: None,
            }),
            delay: None,
        }
    }

    /// Parse `Name=inches;Name=inches`. Blank entries are ignored.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let mut snowfall = Vec::new();
        for entry in raw.split(';').map(str::trim).filter(|e| !e.is_empty()) {
            let (city, inches) = entry.split_once('=').ok_or_else(|| {
                CoreError::Validation(format!(
                    "Snowfall entry must look like Name=inches, got \"{entry}\""
                ))
            })?;
            let inches: f64 = inches.trim().parse().map_err(|_| {
                CoreError::Validation(format!("Invalid snowfall for {city}: \"{inches}\""))
            })?;
            snowfall.push((city.trim().to_string(), inches));
        }
        Ok(Self::new(snowfall))
    }

    /// Respond only after `delay`. Used to exercise fetch timeouts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Set the snowfall reported for `city`.
    pub fn set_snowfall(&self, city: &str, inches: f64) -> Result<(), FetchError> {
        self.conditions
            .lock()
            .map_err(poison_err)?
            .snowfall
            .insert(city.to_string(), inches);
        Ok(())
    }

    /// Fail every fetch with `reason` until [`Self::recover`] is called.
    pub fn fail_with(&self, reason: &str) -> Result<(), FetchError> {
        self.conditions.lock().map_err(poison_err)?.failure = Some(reason.to_string());
        Ok(())
    }

    pub fn recover(&self) -> Result<(), FetchError> {
        self.conditions.lock().map_err(poison_err)?.failure = None;
        Ok(())
    }
}

#[async_trait]
impl WeatherSource for StaticWeatherSource {
    async fn fetch_current(
        &self,
        cities: &[MonitoredCity],
    ) -> Result<Vec<CityWeatherReading>, FetchError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let conditions = self.conditions.lock().map_err(poison_err)?;
        if let Some(reason) = &conditions.failure {
            return Err(FetchError::Unavailable(reason.clone()));
        }

        let captured_at = Utc::now();
        Ok(cities
            .iter()
            .map(|city| CityWeatherReading {
                city: city.name.clone(),
                snowfall_inches: conditions.snowfall.get(&city.name).copied().unwrap_or(0.0),
                temperature_f: None,
                captured_at,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn cities() -> Vec<MonitoredCity> {
        vec![MonitoredCity::new("A", 1.0, 1.0), MonitoredCity::new("B", 2.0, 2.0)]
    }

    #[tokio::test]
    async fn reports_configured_and_zero_values() {
        let source = StaticWeatherSource::new([("A", 3.5)]);
        let readings = source.fetch_current(&cities()).await.unwrap();

        assert_eq!(readings.len(), 2);
        assert_eq!(readings[0].snowfall_inches, 3.5);
        assert_eq!(readings[1].snowfall_inches, 0.0);
    }

    #[tokio::test]
    async fn failing_source_reports_unavailable() {
        let source = StaticWeatherSource::default();
        source.fail_with("provider down").unwrap();

        assert_matches!(
            source.fetch_current(&cities()).await,
            Err(FetchError::Unavailable(_))
        );

        source.recover().unwrap();
        assert!(source.fetch_current(&cities()).await.is_ok());
    }

    #[test]
    fn parses_snowfall_list() {
        let source = StaticWeatherSource::parse("A=3.5; B = 0 ;").unwrap();
        let conditions = source.conditions.lock().unwrap();
        assert_eq!(conditions.snowfall.get("A"), Some(&3.5));
        assert_eq!(conditions.snowfall.get("B"), Some(&0.0));
    }

    #[test]
    fn rejects_malformed_snowfall_list() {
        assert!(StaticWeatherSource::parse("A:3.5").is_err());
        assert!(StaticWeatherSource::parse("A=deep").is_err());
    }
}
