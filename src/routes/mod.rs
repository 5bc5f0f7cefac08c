//! Route gateway: merges every subrouter and attaches shared state.

use std::sync::Arc;

use axum::{http::StatusCode, response::IntoResponse, response::Response, Json, Router};
use serde::Serialize;

use crate::{Config, CoreError, ForecastService};

mod forecast;
mod health;
mod validation;

/// State shared by all handlers.
pub type AppState = (Arc<ForecastService>, Config);

// ---

pub fn router(service: Arc<ForecastService>, config: Config) -> Router {
    // ---
    Router::new()
        .merge(forecast::router())
        .merge(validation::router())
        .merge(health::router())
        .with_state((service, config))
}

/// JSON body for failed requests.
#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
    /// Whether retrying later may help.
    retry: bool,
}

/// Map a core error onto an HTTP response.
fn error_response(err: &CoreError) -> Response {
    // ---
    let (status, kind, retry) = match err {
        CoreError::Upstream { .. } => (StatusCode::BAD_GATEWAY, "upstream", true),
        CoreError::Data(_) => (StatusCode::UNPROCESSABLE_ENTITY, "data", false),
        CoreError::EmptySeries(_) => (StatusCode::NOT_FOUND, "empty_series", false),
    };
    let body = ErrorBody {
        error: kind,
        message: err.to_string(),
        retry,
    };
    (status, Json(body)).into_response()
}
