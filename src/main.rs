//! Application entry point for the `vineyard-outlook` service.
//!
//! This binary orchestrates the startup sequence:
//! - Loading configuration from environment variables or `.env`
//! - Initializing structured logging/tracing
//! - Building the cached forecast service for the configured vineyard
//! - Mounting all API routes via the `routes` gateway (EMBP pattern)
//! - Binding the Axum HTTP server and serving requests
//!
//! # Environment Variables
//! - `OWM_API_KEY` (**required**) – OpenWeatherMap API key
//! - `OUTLOOK_LOG_LEVEL` (optional) – log verbosity (default: `debug`)
//! - `OUTLOOK_SPAN_EVENTS` (optional) – span event mode for tracing
//!
//! See `config` for the remaining variables.
use std::{env, net::SocketAddr, sync::Arc};

use axum::Router;
use dotenvy::dotenv;
use is_terminal::IsTerminal;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use anyhow::Result;

use vineyard_outlook::{config, routes, ForecastService, OpenWeatherClient};

// ---

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    init_tracing();
    dotenv().ok();

    let cfg = config::load_from_env()?;
    cfg.log_config();

    let client = OpenWeatherClient::new(cfg.api_key.clone(), cfg.api_url.clone());
    let service = Arc::new(ForecastService::new(
        client,
        cfg.location(),
        cfg.forecast_cache_ttl,
    ));

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.http_port));

    // Build app from routes gateway (EMBP)
    let app: Router = routes::router(service, cfg);

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ---

/// Install the global subscriber. Honours `RUST_LOG`/`OUTLOOK_LOG_LEVEL`,
/// `OUTLOOK_SPAN_EVENTS` (`full`, `enter_exit`) and `FORCE_COLOR`.
fn init_tracing() {
    // ---
    let span_events = match env::var("OUTLOOK_SPAN_EVENTS").as_deref() {
        Ok("full") => FmtSpan::FULL,
        Ok("enter_exit") => FmtSpan::ENTER | FmtSpan::EXIT,
        _ => FmtSpan::CLOSE,
    };

    let use_color = match env::var("FORCE_COLOR").as_deref() {
        Ok("1") | Ok("true") | Ok("yes") => true,
        Ok("0") | Ok("false") | Ok("no") => false,
        _ => std::io::stdout().is_terminal(),
    };

    // Use RUST_LOG if available, otherwise fall back to OUTLOOK_LOG_LEVEL
    let env_filter = if env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match env::var("OUTLOOK_LOG_LEVEL").ok().as_deref() {
            Some("trace") => "trace",
            Some("debug") => "debug",
            Some("info") => "info",
            Some("warn") => "warn",
            Some("error") => "error",
            _ => "debug",
        };
        EnvFilter::new(format!("{level},hyper=warn,reqwest=warn"))
    };

    tracing_subscriber::fmt()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(span_events)
        .with_env_filter(env_filter)
        .with_ansi(use_color)
        .compact()
        .init();
}
