// Inbound notification receiver; logs and acknowledges

use axum::body::Bytes;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::{Json, Router};
use chrono::Utc;
use serde_json::{Value, json};
use tracing::info;

pub const WEBHOOK_PATH: &str = "/webhook";

pub fn router() -> Router {
    Router::new().route(WEBHOOK_PATH, any(receive))
}

async fn receive(method: Method, body: Bytes) -> Response {
    if method != Method::POST {
        return (StatusCode::METHOD_NOT_ALLOWED, Json(json!({ "error": "Method not allowed" }))).into_response();
    }

    match serde_json::from_slice::<Value>(&body) {
        Ok(payload) => {
            let pretty = serde_json::to_string_pretty(&payload).unwrap_or_else(|_| payload.to_string());
            info!(payload = %pretty, "Webhook received");
        }
        Err(_) => info!(payload = %String::from_utf8_lossy(&body), "Webhook received (not JSON)"),
    }

    Json(json!({
        "received": true,
        "timestamp": Utc::now().to_rfc3339(),
        "message": "Webhook processed successfully",
    }))
    .into_response()
}
