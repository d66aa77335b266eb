use axum::{body::Body, http::Response};
use serde_json::Value;

/// Read the whole response body as JSON.
pub(crate) async fn get_json_body(response: Response<Body>) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("could not read response body");

    serde_json::from_slice(&body).expect("response body is not valid JSON")
}
