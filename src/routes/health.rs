// src/routes/health.rs
//! Health check endpoint for the vineyard outlook service.
//!
//! Follows the Explicit Module Boundary Pattern (EMBP): the handler stays
//! internal and the gateway (`mod.rs`) merges the exported subrouter.

use axum::{routing::get, Json, Router};
use serde::Serialize;

/// JSON response body for the `/health` endpoint.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// Handle `GET /health`.
///
/// Does not touch the forecast provider or the historical record.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Subrouter containing `GET /health`, generic over the gateway state.
pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/health", get(health))
}
