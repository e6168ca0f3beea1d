use std::str::FromStr;
use std::time::Duration;

use axum::http::HeaderValue;
use plowline_core::day_bucket::offset_from_minutes;
use plowline_core::dispatch_options::{
    lead_time_from_minutes, DEFAULT_CONCURRENCY_LIMIT, DEFAULT_DISPATCH_LEAD_MINUTES,
    DEFAULT_OPERATION_TIMEOUT_SECS,
};
use plowline_core::error::CoreError;
use plowline_core::weather::{default_monitored_cities, parse_monitored_cities};
use plowline_dispatch::DispatchConfig;

/// Default period between scheduled dispatch cycles.
pub const DEFAULT_DISPATCH_INTERVAL_SECS: u64 = 900;

/// Where current conditions come from.
#[derive(Debug, Clone, PartialEq)]
pub enum WeatherProvider {
    /// Fixed readings parsed from `STATIC_SNOWFALL` (`Name=inches;...`).
    Static { snowfall: String },
    /// Live readings from OpenWeatherMap.
    OpenWeatherMap { api_key: String },
}

/// Server configuration loaded from environment variables.
///
/// All fields except the database URL have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Options shared by scheduled and manual dispatch cycles.
    pub dispatch: DispatchConfig,
    /// Period of the background dispatch scheduler. Zero disables it.
    pub dispatch_interval: Duration,
    /// Weather source selection.
    pub weather: WeatherProvider,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                       | Default                 |
    /// |-------------------------------|-------------------------|
    /// | `HOST`                        | `0.0.0.0`               |
    /// | `PORT`                        | `3000`                  |
    /// | `CORS_ORIGINS`                | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`        | `30`                    |
    /// | `DISPATCH_LEAD_MINUTES`       | `120`                   |
    /// | `DISPATCH_CONCURRENCY`        | `8`                     |
    /// | `DISPATCH_OP_TIMEOUT_SECS`    | `10`                    |
    /// | `DISPATCH_UTC_OFFSET_MINUTES` | `0`                     |
    /// | `DISPATCH_INTERVAL_SECS`      | `900` (`0` disables)    |
    /// | `MONITORED_CITIES`            | eight demo cities       |
    /// | `WEATHER_PROVIDER`            | `static`                |
    /// | `OPENWEATHERMAP_API_KEY`      | required for `openweathermap` |
    /// | `STATIC_SNOWFALL`             | empty                   |
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = parse_or(&lookup, "PORT", 3000)?;

        let cors_origins: Vec<String> = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        for origin in &cors_origins {
            HeaderValue::from_str(origin).map_err(|e| {
                CoreError::Validation(format!("Invalid CORS origin '{origin}': {e}"))
            })?;
        }

        let request_timeout_secs: u64 = parse_or(&lookup, "REQUEST_TIMEOUT_SECS", 30)?;

        let dispatch = dispatch_config(&lookup)?;
        let dispatch_interval = Duration::from_secs(parse_or(
            &lookup,
            "DISPATCH_INTERVAL_SECS",
            DEFAULT_DISPATCH_INTERVAL_SECS,
        )?);

        let weather = match lookup("WEATHER_PROVIDER").as_deref().map(str::trim) {
            None | Some("") | Some("static") => WeatherProvider::Static {
                snowfall: lookup("STATIC_SNOWFALL").unwrap_or_default(),
            },
            Some("openweathermap") => {
                let api_key = lookup("OPENWEATHERMAP_API_KEY")
                    .filter(|k| !k.trim().is_empty())
                    .ok_or_else(|| {
                        CoreError::Validation(
                            "OPENWEATHERMAP_API_KEY must be set for the openweathermap provider"
                                .to_string(),
                        )
                    })?;
                WeatherProvider::OpenWeatherMap { api_key }
            }
            Some(other) => {
                return Err(CoreError::Validation(format!(
                    "Unknown WEATHER_PROVIDER '{other}' (expected static or openweathermap)"
                )))
            }
        };

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            dispatch,
            dispatch_interval,
            weather,
        })
    }
}

fn dispatch_config<F>(lookup: &F) -> Result<DispatchConfig, CoreError>
where
    F: Fn(&str) -> Option<String>,
{
    let cities = match lookup("MONITORED_CITIES") {
        Some(raw) if !raw.trim().is_empty() => parse_monitored_cities(&raw)?,
        _ => default_monitored_cities(),
    };

    let lead_minutes: i64 =
        parse_or(lookup, "DISPATCH_LEAD_MINUTES", DEFAULT_DISPATCH_LEAD_MINUTES)?;
    let timeout_secs: u64 =
        parse_or(lookup, "DISPATCH_OP_TIMEOUT_SECS", DEFAULT_OPERATION_TIMEOUT_SECS)?;
    let offset_minutes: i32 = parse_or(lookup, "DISPATCH_UTC_OFFSET_MINUTES", 0)?;

    let config = DispatchConfig {
        cities,
        dispatch_lead_time: lead_time_from_minutes(lead_minutes)?,
        concurrency_limit: parse_or(lookup, "DISPATCH_CONCURRENCY", DEFAULT_CONCURRENCY_LIMIT)?,
        per_operation_timeout: Duration::from_secs(timeout_secs),
        day_offset: offset_from_minutes(offset_minutes)?,
    };
    config.validate()?;
    Ok(config)
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, CoreError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| CoreError::Validation(format!("{key} has an invalid value: '{raw}'"))),
        _ => Ok(default),
    }
}
