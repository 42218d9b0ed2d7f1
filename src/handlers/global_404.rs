use axum::http::{Method, Uri};
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
}

/// Fallback for every route the relay does not serve
pub async fn global_404_handler(method: Method, uri: Uri) -> impl IntoResponse {
    let message = format!("Route `{method} {uri}` does not exist");
    tracing::debug!("{message}");
    let response = ErrorResponse {
        success: false,
        message,
    };
    (StatusCode::NOT_FOUND, Json(response))
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, http::Request, routing::get, Router};
    use tower::ServiceExt; // for `oneshot` and `ready`

    use super::*;

    #[tokio::test]
    async fn test_global_404_handler() {
        let app = Router::new()
            .route("/", get(|| async {}))
            .fallback(global_404_handler);
        let req = Request::builder()
            .uri("/notifications")
            .method("POST")
            .body(Body::empty())
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        let body = hyper::body::to_bytes(res.into_body()).await.unwrap();
        let res_404: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert!(!res_404.success);
        assert_eq!(res_404.message, "Route `POST /notifications` does not exist");
    }
}
