use axum::error_handling::HandleErrorLayer;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{BoxError, Json, Router};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::{
    constants::REQUEST_TIMEOUT_SECS,
    handlers::{global_404::ErrorResponse, *},
};

pub fn build_app() -> Router {
    tracing::debug!("Initializing the app");
    Router::new()
        .route("/", get(health_handler))
        .fallback(global_404_handler)
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_layer_error))
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .layer(TraceLayer::new_for_http()),
        )
}

async fn handle_layer_error(err: BoxError) -> (StatusCode, Json<ErrorResponse>) {
    let (status, message) = if err.is::<tower::timeout::error::Elapsed>() {
        (StatusCode::REQUEST_TIMEOUT, "Request timed out".to_owned())
    } else {
        let msg = format!("Something went wrong: {err}");
        (StatusCode::INTERNAL_SERVER_ERROR, msg)
    };
    tracing::debug!("{message}");
    let response = ErrorResponse {
        success: false,
        message,
    };
    (status, Json(response))
}
