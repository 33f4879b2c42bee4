//! Health check endpoint

use hyper::{Response, StatusCode};
use serde::Serialize;

use crate::routes::{json_response, BoxBody};

#[derive(Serialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub version: &'static str,
    pub timestamp: String,
}

/// Handle liveness probe (/health, /healthz)
pub fn health_check() -> Response<BoxBody> {
    json_response(
        StatusCode::OK,
        &HealthResponse {
            healthy: true,
            version: env!("CARGO_PKG_VERSION"),
            timestamp: chrono::Utc::now().to_rfc3339(),
        },
    )
}
