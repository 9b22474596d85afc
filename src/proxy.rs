// HTTP endpoint translating CRUD verbs into remote table calls

use crate::error::ProxyError;
use crate::remote::TableBackend;
use crate::webhook;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::{Json, Router};
use serde_json::{Map, Value};
use std::sync::Arc;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

/// Path of the proxy endpoint
pub const PROXY_PATH: &str = "/api/airtable";

const CORS_ALLOW_METHODS: &str = "GET, POST, PATCH, DELETE, OPTIONS";
const CORS_ALLOW_HEADERS: &str = "Content-Type, Authorization";

#[derive(Clone)]
pub struct ProxyState {
    backend: Arc<dyn TableBackend>,
}

/// Build the application router: the proxy endpoint plus the webhook receiver
pub fn router(backend: Arc<dyn TableBackend>) -> Router {
    let proxy = Router::new()
        .route(PROXY_PATH, any(handle))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(CORS_ALLOW_METHODS),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(CORS_ALLOW_HEADERS),
        ))
        .with_state(ProxyState { backend });

    proxy.merge(webhook::router()).layer(TraceLayer::new_for_http())
}

async fn handle(State(state): State<ProxyState>, method: Method, body: Bytes) -> Response {
    match dispatch(state.backend.as_ref(), &method, &body).await {
        Ok(response) => response,
        Err(e) => {
            if let ProxyError::Upstream(upstream) = &e {
                error!(%method, error = %upstream, details = %upstream.details(), "Table API error");
            }
            e.into_response()
        }
    }
}

async fn dispatch(backend: &dyn TableBackend, method: &Method, body: &[u8]) -> Result<Response, ProxyError> {
    match *method {
        Method::OPTIONS => Ok(StatusCode::OK.into_response()),
        Method::GET => {
            let records = backend.list().await?;
            Ok((StatusCode::OK, Json(records)).into_response())
        }
        Method::POST => {
            let mut body = parse_body(body);
            let fields = take_fields(&mut body).ok_or(ProxyError::Validation("fields required"))?;
            let created = backend.create(fields).await?;
            Ok((StatusCode::CREATED, Json(created)).into_response())
        }
        Method::PATCH => {
            let mut body = parse_body(body);
            let (Some(id), Some(fields)) = (take_id(&mut body), take_fields(&mut body)) else {
                return Err(ProxyError::Validation("id and fields required"));
            };
            debug!(%id, "Patching record");
            let updated = backend.update(&id, fields).await?;
            Ok((StatusCode::OK, Json(updated)).into_response())
        }
        Method::DELETE => {
            let mut body = parse_body(body);
            let id = take_id(&mut body).ok_or(ProxyError::Validation("id required"))?;
            debug!(%id, "Deleting record");
            let ack = backend.delete(&id).await?;
            Ok((StatusCode::OK, Json(ack)).into_response())
        }
        _ => Err(ProxyError::MethodNotAllowed(method.clone())),
    }
}

/// Request body as a JSON object; anything else counts as empty
fn parse_body(body: &[u8]) -> Map<String, Value> {
    match serde_json::from_slice(body) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

/// A present, non-empty record identifier
fn take_id(body: &mut Map<String, Value>) -> Option<String> {
    match body.remove("id")? {
        Value::String(s) if !s.is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn take_fields(body: &mut Map<String, Value>) -> Option<Value> {
    body.remove("fields").filter(|v| !v.is_null())
}
