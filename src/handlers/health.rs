use axum::{http::StatusCode, response::IntoResponse, Json};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    pub timestamp: String,
}

/// Handler function for the health check route "/"
/// Returns a JSON response with 200 status code
pub async fn health_handler() -> impl IntoResponse {
    let response = HealthResponse {
        status: "running".to_owned(),
        message: "Push notification relay active".to_owned(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    };
    (StatusCode::OK, Json(response))
}
