use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use vineyard_outlook::forecast::{self, CacheKey};
use vineyard_outlook::{routes, Config, ForecastService, Location, OpenWeatherClient};

// ---

const ICA: Location = Location {
    latitude: -14.0678,
    longitude: -75.7286,
};

fn test_config(history_csv: PathBuf) -> Config {
    // ---
    Config {
        api_key: "test-key".into(),
        // Nothing listens on the discard port; fetches fail fast
        api_url: "http://127.0.0.1:9".into(),
        latitude: ICA.latitude,
        longitude: ICA.longitude,
        base_temp_c: 10.0,
        history_csv,
        forecast_cache_ttl: Duration::from_secs(3600),
        http_port: 0,
    }
}

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn build_app(config: Config) -> (Router, Arc<ForecastService>) {
    // ---
    let client = OpenWeatherClient::new(config.api_key.clone(), config.api_url.clone());
    let service = Arc::new(ForecastService::new(
        client,
        config.location(),
        config.forecast_cache_ttl,
    ));
    (routes::router(service.clone(), config), service)
}

/// Two days of 3-hourly samples, all inside the oidium band, first day wet.
fn forecast_payload() -> Value {
    // ---
    let list: Vec<Value> = (0..16)
        .map(|i| {
            let rain = if i < 8 { 1.5 } else { 0.0 };
            json!({
                "dt": 1736899200 + i * 10800,
                "main": {"temp": 22.0, "temp_min": 12.0, "temp_max": 28.0},
                "rain": {"3h": rain}
            })
        })
        .collect();
    json!({"cod": "200", "list": list, "city": {"name": "Ica", "timezone": 0}})
}

async fn send(app: Router, method: Method, uri: &str) -> Result<(StatusCode, Value)> {
    // ---
    let request = Request::builder().method(method).uri(uri).body(Body::empty())?;
    let response = app.oneshot(request).await?;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    Ok((status, serde_json::from_slice(&bytes)?))
}

#[tokio::test]
async fn health_reports_ok() -> Result<()> {
    // ---
    let (app, _) = build_app(test_config(fixture("datos_historicos.csv")));
    let (status, body) = send(app, Method::GET, "/health").await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
    Ok(())
}

#[tokio::test]
async fn forecast_outlook_from_cached_forecast() -> Result<()> {
    // ---
    let (app, service) = build_app(test_config(fixture("datos_historicos.csv")));
    let decoded = forecast::decode(&forecast_payload())?;
    service.cache().insert(CacheKey::new(ICA), decoded).await;

    let (status, body) = send(app, Method::GET, "/forecast").await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["location_name"], "Ica");
    // mean(28, 12) - 10 = 10 GDD per day over two days
    assert_eq!(body["daily"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["final_cumulative"], 20.0);
    assert_eq!(body["mildew"]["status"], "assessed");
    assert_eq!(body["mildew"]["level"], "HIGH");
    assert_eq!(body["mildew"]["rain_mm"], 12.0);
    assert_eq!(body["oidium"]["level"], "HIGH");
    assert_eq!(body["oidium"]["hours_in_range"], 48);
    Ok(())
}

#[tokio::test]
async fn refresh_surfaces_upstream_failure() -> Result<()> {
    // ---
    let (app, service) = build_app(test_config(fixture("datos_historicos.csv")));
    let decoded = forecast::decode(&forecast_payload())?;
    service.cache().insert(CacheKey::new(ICA), decoded).await;

    // Refresh drops the cached forecast, then the fetch fails
    let (status, body) = send(app, Method::POST, "/forecast/refresh").await?;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "upstream");
    assert_eq!(body["retry"], true);
    assert!(service.cache().get(&CacheKey::new(ICA)).await.is_none());
    Ok(())
}

#[tokio::test]
async fn validation_backtests_fixture() -> Result<()> {
    // ---
    let (app, _) = build_app(test_config(fixture("datos_historicos.csv")));
    let (status, body) = send(app, Method::GET, "/validation").await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["daily"].as_array().map(Vec::len), Some(30));
    // "Envero" carries no threshold and is not back-tested
    assert_eq!(body["events"].as_array().map(Vec::len), Some(2));

    let results = &body["backtest"]["results"];
    assert_eq!(results[0]["kind"], "BUDBREAK");
    assert_eq!(results[0]["predicted_date"], "2024-08-05");
    assert_eq!(results[0]["error_days"], 2);
    assert_eq!(results[0]["timing"], "late");
    assert_eq!(results[1]["kind"], "BLOOM");
    assert_eq!(results[1]["predicted_date"], "2024-08-25");
    assert_eq!(results[1]["error_days"], -1);
    assert_eq!(results[1]["timing"], "early");

    let summary = &body["backtest"]["summary"];
    assert_eq!(summary["status"], "resolved");
    assert_eq!(summary["mean_absolute_error"], 1.5);
    Ok(())
}

#[tokio::test]
async fn validation_with_missing_history_has_no_events() -> Result<()> {
    // ---
    let (app, _) = build_app(test_config(fixture("does_not_exist.csv")));
    let (status, body) = send(app, Method::GET, "/validation").await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["daily"], json!([]));
    assert_eq!(body["backtest"]["summary"], json!({"status": "no_events"}));
    Ok(())
}

#[tokio::test]
async fn mean_error_reports_resolved_events() -> Result<()> {
    // ---
    let (app, _) = build_app(test_config(fixture("datos_historicos.csv")));
    let (status, body) = send(app, Method::GET, "/validation/mean-error").await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"mean_absolute_error": 1.5}));
    Ok(())
}

#[tokio::test]
async fn mean_error_without_events_is_not_found() -> Result<()> {
    // ---
    let (app, _) = build_app(test_config(fixture("does_not_exist.csv")));
    let (status, body) = send(app, Method::GET, "/validation/mean-error").await?;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "empty_series");
    assert_eq!(body["retry"], false);
    Ok(())
}
