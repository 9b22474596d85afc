// Typed errors for the proxy endpoint and the dashboard view

use axum::Json;
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};
use thiserror::Error;

/// Verbs the proxy endpoint accepts, as advertised in the `Allow` header
pub const ALLOWED_METHODS: &str = "GET, POST, PATCH, DELETE";

/// Failure talking to the remote table API
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("remote returned {status}")]
    Status { status: u16, details: Value },
}

impl UpstreamError {
    /// Payload passed through to the caller as `details`
    pub fn details(&self) -> Value {
        match self {
            UpstreamError::Transport(msg) => Value::String(msg.clone()),
            UpstreamError::Status { details, .. } => details.clone(),
        }
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(e: reqwest::Error) -> Self {
        UpstreamError::Transport(e.to_string())
    }
}

/// Errors answered by the proxy endpoint
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("{0}")]
    Validation(&'static str),

    #[error("upstream failure: {0}")]
    Upstream(#[from] UpstreamError),

    #[error("Method {0} Not Allowed")]
    MethodNotAllowed(Method),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Validation(_) => StatusCode::BAD_REQUEST,
            ProxyError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();
        match self {
            ProxyError::Validation(msg) => (status, Json(json!({ "error": msg }))).into_response(),
            ProxyError::Upstream(e) => (
                status,
                Json(json!({
                    "error": "API error",
                    "details": e.details(),
                })),
            )
                .into_response(),
            ProxyError::MethodNotAllowed(_) => {
                let mut resp = (status, message).into_response();
                resp.headers_mut()
                    .insert(header::ALLOW, HeaderValue::from_static(ALLOWED_METHODS));
                resp
            }
        }
    }
}

/// Failure seen by the dashboard view when calling the proxy.
///
/// The view never surfaces these to the renderer directly; it logs them and
/// keeps the most recent one in `Dashboard::last_error`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("proxy answered {status}: {body}")]
    Status { status: u16, body: Value },

    #[error("list response is not an array")]
    NotAnArray,

    #[error("failed to decode response: {0}")]
    Decode(String),
}

/// A view transition rejected before any request was made
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ViewError {
    #[error("record {0} is not in the list")]
    UnknownRecord(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            FetchError::Decode(e.to_string())
        } else {
            FetchError::Transport(e.to_string())
        }
    }
}
