//! Forecast outlook endpoints: projected GDD plus mildew and oidium risk.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info};

use super::{error_response, AppState};
use crate::pipeline::resolve_outlook;
use crate::CoreResult;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/forecast", get(outlook))
        .route("/forecast/refresh", post(refresh))
}

async fn outlook(State((service, config)): State<AppState>) -> Response {
    // ---
    info!("GET /forecast");
    respond(resolve_outlook(service.forecast().await, config.base_temp_c))
}

async fn refresh(State((service, config)): State<AppState>) -> Response {
    // ---
    info!("POST /forecast/refresh");
    respond(resolve_outlook(service.refresh().await, config.base_temp_c))
}

fn respond<T: serde::Serialize>(result: CoreResult<T>) -> Response {
    match result {
        Ok(outlook) => (StatusCode::OK, Json(outlook)).into_response(),
        Err(e) => {
            error!("Forecast outlook failed: {}", e);
            error_response(&e)
        }
    }
}
