//! Weather readings and the monitored city list.
//!
//! Readings come from an untrusted source, so everything the dispatcher
//! relies on (finite, non-negative snowfall, a named city) is checked here
//! before a reading is allowed to match contracts.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Millimetres in one inch. Weather providers report precipitation in mm.
pub const MM_PER_INCH: f64 = 25.4;

/// Maximum length of a monitored city name.
const MAX_CITY_NAME_LEN: usize = 128;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A city whose weather is polled on every dispatch cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoredCity {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl MonitoredCity {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
        }
    }
}

/// Current conditions for one city. Produced fresh each cycle, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityWeatherReading {
    pub city: String,
    pub snowfall_inches: f64,
    /// Display only; the dispatcher never looks at it.
    pub temperature_f: Option<f64>,
    pub captured_at: Timestamp,
}

impl CityWeatherReading {
    /// Whether this reading can trigger dispatch at all.
    ///
    /// Zero-snowfall readings never trigger, regardless of contract thresholds.
    pub fn has_snowfall(&self) -> bool {
        self.snowfall_inches > 0.0
    }
}

// ---------------------------------------------------------------------------
// Conversion
// ---------------------------------------------------------------------------

/// Convert a precipitation depth in millimetres to inches, rounded to the
/// nearest hundredth.
pub fn millimetres_to_inches(mm: f64) -> f64 {
    (mm / MM_PER_INCH * 100.0).round() / 100.0
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a reading received from a weather source.
///
/// Rules:
/// - City must not be blank.
/// - Snowfall must be finite and non-negative.
pub fn validate_reading(reading: &CityWeatherReading) -> Result<(), CoreError> {
    if reading.city.trim().is_empty() {
        return Err(CoreError::Validation(
            "Weather reading has a blank city".to_string(),
        ));
    }
    if !reading.snowfall_inches.is_finite() || reading.snowfall_inches < 0.0 {
        return Err(CoreError::Validation(format!(
            "Snowfall for {} must be a non-negative number, got {}",
            reading.city, reading.snowfall_inches
        )));
    }
    Ok(())
}

/// Validate a single monitored city definition.
pub fn validate_city(city: &MonitoredCity) -> Result<(), CoreError> {
    if city.name.trim().is_empty() {
        return Err(CoreError::Validation(
            "City name must not be empty".to_string(),
        ));
    }
    if city.name.len() > MAX_CITY_NAME_LEN {
        return Err(CoreError::Validation(format!(
            "City name must not exceed {MAX_CITY_NAME_LEN} characters"
        )));
    }
    if !(-90.0..=90.0).contains(&city.latitude) {
        return Err(CoreError::Validation(format!(
            "Latitude for {} must be between -90 and 90, got {}",
            city.name, city.latitude
        )));
    }
    if !(-180.0..=180.0).contains(&city.longitude) {
        return Err(CoreError::Validation(format!(
            "Longitude for {} must be between -180 and 180, got {}",
            city.name, city.longitude
        )));
    }
    Ok(())
}

/// Validate the full monitored city list. Names must be unique.
pub fn validate_cities(cities: &[MonitoredCity]) -> Result<(), CoreError> {
    let mut seen = std::collections::HashSet::with_capacity(cities.len());
    for city in cities {
        validate_city(city)?;
        if !seen.insert(city.name.as_str()) {
            return Err(CoreError::Validation(format!(
                "Duplicate monitored city: \"{}\"",
                city.name
            )));
        }
    }
    Ok(())
}

/// Parse a monitored city list of the form `Name|lat|lon;Name|lat|lon`.
///
/// Blank entries are ignored. The parsed list is validated as a whole.
pub fn parse_monitored_cities(raw: &str) -> Result<Vec<MonitoredCity>, CoreError> {
    let mut cities = Vec::new();
    for entry in raw.split(';').map(str::trim).filter(|e| !e.is_empty()) {
        let parts: Vec<&str> = entry.split('|').map(str::trim).collect();
        let [name, lat, lon] = parts.as_slice() else {
            return Err(CoreError::Validation(format!(
                "Monitored city entry must look like Name|lat|lon, got \"{entry}\""
            )));
        };
        let latitude: f64 = lat.parse().map_err(|_| {
            CoreError::Validation(format!("Invalid latitude for {name}: \"{lat}\""))
        })?;
        let longitude: f64 = lon.parse().map_err(|_| {
            CoreError::Validation(format!("Invalid longitude for {name}: \"{lon}\""))
        })?;
        cities.push(MonitoredCity::new(*name, latitude, longitude));
    }
    validate_cities(&cities)?;
    Ok(cities)
}

/// The demo city list used when no `MONITORED_CITIES` value is configured.
pub fn default_monitored_cities() -> Vec<MonitoredCity> {
    vec![
        MonitoredCity::new("City 1", 42.3601, -71.0589),
        MonitoredCity::new("City 2", 41.8781, -87.6298),
        MonitoredCity::new("City 3", 40.7128, -74.0060),
        MonitoredCity::new("City 4", 39.9526, -75.1652),
        MonitoredCity::new("City 5", 47.6062, -122.3321),
        MonitoredCity::new("City 6", 37.7749, -122.4194),
        MonitoredCity::new("City 7", 34.0522, -118.2437),
        MonitoredCity::new("City 8", 25.7617, -80.1918),
    ]
}
