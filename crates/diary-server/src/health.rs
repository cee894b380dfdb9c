//! `/health` endpoint.

use axum::Json;
use serde::Serialize;

/// Service name reported by the health check.
pub const SERVICE_NAME: &str = "diary-backend";

/// Health check response body.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Always `"healthy"` while the server is answering.
    pub status: &'static str,
    /// Service name.
    pub service: &'static str,
}

/// Build the health response.
pub fn health_check() -> HealthResponse {
    HealthResponse {
        status: "healthy",
        service: SERVICE_NAME,
    }
}

/// GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(health_check())
}
