//! Historical validation endpoint: GDD model back-tested against observed
//! phenology.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tracing::{error, info};

use super::{error_response, AppState};
use crate::history;
use crate::models::HistoricalRecord;
use crate::pipeline::validation_report;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/validation", get(handler))
        .route("/validation/mean-error", get(mean_error))
}

async fn handler(State((_, config)): State<AppState>) -> Response {
    // ---
    info!("GET /validation - reading {}", config.history_csv.display());

    let records = match load_history(&config.history_csv).await {
        Ok(records) => records,
        Err(response) => return response,
    };

    let report = validation_report(&records, config.base_temp_c);
    (StatusCode::OK, Json(report)).into_response()
}

/// Mean absolute error of the back-test alone; 404 when nothing resolved.
async fn mean_error(State((_, config)): State<AppState>) -> Response {
    // ---
    info!("GET /validation/mean-error - reading {}", config.history_csv.display());

    let records = match load_history(&config.history_csv).await {
        Ok(records) => records,
        Err(response) => return response,
    };

    let report = validation_report(&records, config.base_temp_c);
    match report.backtest.mean_absolute_error() {
        Ok(mae) => (StatusCode::OK, Json(json!({ "mean_absolute_error": mae }))).into_response(),
        Err(e) => {
            info!("No mean error available: {}", e);
            error_response(&e)
        }
    }
}

async fn load_history(path: &std::path::Path) -> Result<Vec<HistoricalRecord>, Response> {
    // ---
    let path = path.to_path_buf();
    match tokio::task::spawn_blocking(move || history::load(&path)).await {
        Ok(Ok(records)) => Ok(records),
        Ok(Err(e)) => {
            error!("Failed to load historical record: {}", e);
            Err(error_response(&e))
        }
        Err(e) => {
            error!("Historical record loader panicked: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR.into_response())
        }
    }
}
