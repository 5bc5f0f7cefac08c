//! Configuration loader for the `vineyard-outlook` service.
//!
//! This module centralizes all runtime configuration values and their defaults,
//! loading from environment variables (with optional `.env` file support
//! provided by the caller). Defaults point at the Ica valley vineyard.
//!
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Result};

use crate::forecast::Location;
use crate::thresholds::VINE_BASE_TEMP_C;

/// Parse an optional environment variable of type `$ty` with a default value.
macro_rules! parse_env {
    ($var_name:expr, $ty:ty, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.trim().parse::<$ty>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse a required string environment variable.
macro_rules! require_env {
    ($var_name:expr) => {
        env::var($var_name)
            .map_err(|_| anyhow!("{} must be set in .env or environment", $var_name))?
    };
}

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// OpenWeatherMap API key.
    pub api_key: String,

    /// Forecast API base URL.
    pub api_url: String,

    /// Vineyard latitude in decimal degrees.
    pub latitude: f64,

    /// Vineyard longitude in decimal degrees.
    pub longitude: f64,

    /// GDD base temperature [°C].
    pub base_temp_c: f64,

    /// Historical weather and phenology CSV.
    pub history_csv: PathBuf,

    /// How long a fetched forecast is reused.
    pub forecast_cache_ttl: Duration,

    /// HTTP listen port.
    pub http_port: u16,
}

/// Load configuration from environment variables with defaults.
///
/// Required:
/// - `OWM_API_KEY` – OpenWeatherMap API key
///
/// Optional:
/// - `OWM_API_URL` – API base URL (default: `https://api.openweathermap.org/data/2.5`)
/// - `VINEYARD_LAT` / `VINEYARD_LON` – coordinates (default: Ica, -14.0678 / -75.7286)
/// - `GDD_BASE_TEMP` – base temperature in °C (default: 10.0)
/// - `HISTORY_CSV` – historical record path (default: `datos_historicos_ica.csv`)
/// - `FORECAST_CACHE_TTL_SECS` – forecast reuse window (default: 3600)
/// - `HTTP_PORT` – listen port (default: 8080)
///
/// Returns an error if any required variable is missing or invalid.
pub fn load_from_env() -> Result<Config> {
    // ---
    let api_key = require_env!("OWM_API_KEY");
    let api_url = env::var("OWM_API_URL")
        .unwrap_or_else(|_| "https://api.openweathermap.org/data/2.5".to_string());
    let latitude = parse_env!("VINEYARD_LAT", f64, -14.0678);
    let longitude = parse_env!("VINEYARD_LON", f64, -75.7286);
    let base_temp_c = parse_env!("GDD_BASE_TEMP", f64, VINE_BASE_TEMP_C);
    let history_csv = PathBuf::from(
        env::var("HISTORY_CSV").unwrap_or_else(|_| "datos_historicos_ica.csv".to_string()),
    );
    let cache_ttl_secs = parse_env!("FORECAST_CACHE_TTL_SECS", u64, 3600);
    let http_port = parse_env!("HTTP_PORT", u16, 8080);

    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return Err(anyhow!(
            "VINEYARD_LAT/VINEYARD_LON out of range: ({}, {})",
            latitude,
            longitude
        ));
    }

    Ok(Config {
        api_key,
        api_url,
        latitude,
        longitude,
        base_temp_c,
        history_csv,
        forecast_cache_ttl: Duration::from_secs(cache_ttl_secs),
        http_port,
    })
}

impl Config {
    pub fn location(&self) -> Location {
        Location {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }

    /// Log the loaded configuration for debugging purposes.
    ///
    /// Masks the API key while showing all other values that were loaded.
    pub fn log_config(&self) {
        // ---
        let masked_key = mask_secret(&self.api_key);

        tracing::info!("Configuration loaded:");
        tracing::info!("  OWM_API_KEY             : {}", masked_key);
        tracing::info!("  OWM_API_URL             : {}", self.api_url);
        tracing::info!("  VINEYARD_LAT/LON        : {}, {}", self.latitude, self.longitude);
        tracing::info!("  GDD_BASE_TEMP           : {}", self.base_temp_c);
        tracing::info!("  HISTORY_CSV             : {}", self.history_csv.display());
        tracing::info!("  FORECAST_CACHE_TTL_SECS : {}", self.forecast_cache_ttl.as_secs());
        tracing::info!("  HTTP_PORT               : {}", self.http_port);
    }
}

/// Keep the last four characters of a secret.
fn mask_secret(secret: &str) -> String {
    // ---
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{}", tail)
}
