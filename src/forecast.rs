//! Forecast provider plumbing: OpenWeatherMap payload decoding, the HTTP
//! client, and a time-bounded cache in front of it.
//!
//! Nothing here computes agronomic signals; see `pipeline` for that.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, FixedOffset, Offset, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::error::{CoreError, CoreResult};
use crate::models::WeatherSample;

/// Unit system requested from the provider; all thresholds are metric.
pub const UNITS: &str = "metric";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ---

/// Vineyard coordinates in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

/// A decoded 5 day / 3 hour forecast.
#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    pub location_name: Option<String>,
    pub utc_offset: FixedOffset,
    /// Samples in ascending time order.
    pub samples: Vec<WeatherSample>,
}

#[derive(Debug, Deserialize)]
struct OwmItem {
    dt: i64,
    main: Option<OwmMain>,
    rain: Option<OwmRain>,
}

#[derive(Debug, Deserialize)]
struct OwmMain {
    temp: Option<f64>,
    temp_min: Option<f64>,
    temp_max: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwmRain {
    #[serde(rename = "3h")]
    three_hour: Option<f64>,
}

/// The provider reports errors in-band as `cod`, either a string or a number.
fn status_code(payload: &Value) -> Option<String> {
    match payload.get("cod")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

/// Decode a forecast payload.
///
/// A non-200 `cod` is an upstream error and nothing else is looked at. A
/// payload without a sample list is a data error. Individual samples that
/// cannot be read are skipped.
pub fn decode(payload: &Value) -> CoreResult<Forecast> {
    // ---
    if let Some(code) = status_code(payload) {
        if code != "200" {
            let message = payload
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("provider returned an error")
                .to_string();
            return Err(CoreError::upstream(Some(code), message));
        }
    }

    let list = payload
        .get("list")
        .and_then(|l| l.as_array())
        .ok_or_else(|| CoreError::data("forecast payload has no sample list"))?;

    let utc_offset = payload
        .pointer("/city/timezone")
        .and_then(|t| t.as_i64())
        .and_then(|secs| i32::try_from(secs).ok())
        .and_then(FixedOffset::east_opt)
        .unwrap_or_else(|| Utc.fix());

    let location_name = payload
        .pointer("/city/name")
        .and_then(|n| n.as_str())
        .map(String::from);

    let mut samples = Vec::with_capacity(list.len());
    for (i, item) in list.iter().enumerate() {
        let owm = match serde_json::from_value::<OwmItem>(item.clone()) {
            Ok(owm) => owm,
            Err(e) => {
                tracing::debug!("Failed to parse forecast item {}: {} - Raw item: {}", i, e, item);
                continue;
            }
        };
        let Some(timestamp) = DateTime::from_timestamp(owm.dt, 0) else {
            tracing::debug!("Forecast item {} has out-of-range dt {}", i, owm.dt);
            continue;
        };
        let main = owm.main.unwrap_or(OwmMain {
            temp: None,
            temp_min: None,
            temp_max: None,
        });

        samples.push(WeatherSample {
            timestamp: timestamp.with_timezone(&utc_offset),
            temp_instant: main.temp,
            temp_max: main.temp_max,
            temp_min: main.temp_min,
            precip_3h: owm.rain.and_then(|r| r.three_hour),
        });
    }
    samples.sort_by_key(|s| s.timestamp);

    tracing::debug!("Decoded {} of {} forecast items", samples.len(), list.len());

    Ok(Forecast {
        location_name,
        utc_offset,
        samples,
    })
}

/// OpenWeatherMap forecast client.
#[derive(Clone)]
pub struct OpenWeatherClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenWeatherClient {
    pub fn new(api_key: String, base_url: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fetch and decode the forecast for `location`.
    pub async fn fetch(&self, location: Location) -> CoreResult<Forecast> {
        // ---
        let url = format!("{}/forecast", self.base_url);
        tracing::debug!(
            "Fetching forecast from {} for ({}, {})",
            url,
            location.latitude,
            location.longitude
        );

        let response = self
            .client
            .get(&url)
            .query(&[
                ("lat", location.latitude.to_string()),
                ("lon", location.longitude.to_string()),
                ("units", UNITS.to_string()),
                ("appid", self.api_key.clone()),
            ])
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| CoreError::upstream(None, format!("forecast request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CoreError::upstream(None, format!("failed to read forecast body: {}", e)))?;

        let payload: Value = match serde_json::from_str(&body) {
            Ok(v) => v,
            Err(e) => {
                return Err(CoreError::upstream(
                    Some(status.as_u16().to_string()),
                    format!("forecast body is not JSON: {}", e),
                ))
            }
        };

        // Error bodies normally carry `cod`; fall back to the HTTP status
        if !status.is_success() && payload.get("cod").is_none() {
            return Err(CoreError::upstream(
                Some(status.as_u16().to_string()),
                format!("forecast request returned {}", status),
            ));
        }

        decode(&payload)
    }
}

/// Cache key: one entry per location and unit system.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    latitude_e4: i64,
    longitude_e4: i64,
    units: &'static str,
}

impl CacheKey {
    pub fn new(location: Location) -> Self {
        Self {
            latitude_e4: (location.latitude * 1e4).round() as i64,
            longitude_e4: (location.longitude * 1e4).round() as i64,
            units: UNITS,
        }
    }
}

struct CacheEntry {
    fetched_at: Instant,
    forecast: Arc<Forecast>,
}

/// Time-bounded store of recent forecasts.
pub struct ForecastCache {
    ttl: Duration,
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
}

impl ForecastCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Fresh entry for `key`, if any.
    pub async fn get(&self, key: &CacheKey) -> Option<Arc<Forecast>> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|e| e.fetched_at.elapsed() < self.ttl)
            .map(|e| Arc::clone(&e.forecast))
    }

    pub async fn insert(&self, key: CacheKey, forecast: Forecast) -> Arc<Forecast> {
        let forecast = Arc::new(forecast);
        self.entries.write().await.insert(
            key,
            CacheEntry {
                fetched_at: Instant::now(),
                forecast: Arc::clone(&forecast),
            },
        );
        forecast
    }

    /// Drop the entry for `key`; returns whether one existed.
    pub async fn invalidate(&self, key: &CacheKey) -> bool {
        self.entries.write().await.remove(key).is_some()
    }
}

/// Forecast access for the configured vineyard, cache first.
pub struct ForecastService {
    client: OpenWeatherClient,
    cache: ForecastCache,
    location: Location,
}

impl ForecastService {
    pub fn new(client: OpenWeatherClient, location: Location, ttl: Duration) -> Self {
        Self {
            client,
            cache: ForecastCache::new(ttl),
            location,
        }
    }

    pub fn cache(&self) -> &ForecastCache {
        &self.cache
    }

    /// Cached forecast if fresh, otherwise fetch and cache.
    ///
    /// Only successful decodes are cached; errors are retried next call.
    pub async fn forecast(&self) -> CoreResult<Arc<Forecast>> {
        // ---
        let key = CacheKey::new(self.location);
        if let Some(cached) = self.cache.get(&key).await {
            tracing::debug!("Forecast cache hit");
            return Ok(cached);
        }

        tracing::info!("Forecast cache miss, fetching from provider");
        let forecast = self.client.fetch(self.location).await?;
        Ok(self.cache.insert(key, forecast).await)
    }

    /// Invalidate the cached forecast and fetch a new one.
    pub async fn refresh(&self) -> CoreResult<Arc<Forecast>> {
        // ---
        let key = CacheKey::new(self.location);
        if self.cache.invalidate(&key).await {
            tracing::info!("Forecast cache invalidated");
        }
        self.forecast().await
    }
}
