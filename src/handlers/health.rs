use axum::Json;
use crate::models::HealthResponse;
use tracing::debug;

/// Plain-text greeting at the root, used as a liveness probe
pub async fn root_greeting() -> &'static str {
    debug!("Root greeting requested");
    "Hello from the codecollab relay!"
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    debug!("Health check requested");
    Json(HealthResponse {
        status: "ok".to_string(),
        message: "Server is running".to_string(),
    })
}
