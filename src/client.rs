// Dashboard-side client for the proxy endpoint

use crate::error::FetchError;
use crate::record::{Fields, fields_to_json};
use async_trait::async_trait;
use reqwest::{Client, Method, Response};
use serde_json::{Value, json};
use tracing::debug;

/// The proxy verbs as seen from the dashboard
#[async_trait]
pub trait ProxyApi: Send + Sync {
    /// Raw list payload; the view decides whether it is usable
    async fn list(&self) -> Result<Value, FetchError>;

    async fn create(&self, fields: &Fields) -> Result<Value, FetchError>;

    async fn update(&self, id: &str, fields: &Fields) -> Result<Value, FetchError>;

    async fn delete(&self, id: &str) -> Result<Value, FetchError>;
}

/// Talks to the proxy over HTTP
#[derive(Debug, Clone)]
pub struct HttpProxyClient {
    http: Client,
    url: String,
}

impl HttpProxyClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn call(&self, method: Method, body: Option<Value>) -> Result<Value, FetchError> {
        debug!(%method, url = %self.url, "Calling proxy");
        let mut request = self.http.request(method, &self.url);
        if let Some(body) = body {
            request = request.json(&body);
        }
        read_json(request.send().await?).await
    }
}

async fn read_json(response: Response) -> Result<Value, FetchError> {
    let status = response.status();
    let text = response.text().await?;
    let body = if text.trim().is_empty() {
        Ok(Value::Null)
    } else {
        serde_json::from_str(&text)
    };

    if status.is_success() {
        body.map_err(|e| FetchError::Decode(e.to_string()))
    } else {
        // Error pages are not always JSON; keep them as text
        Err(FetchError::Status {
            status: status.as_u16(),
            body: body.unwrap_or(Value::String(text)),
        })
    }
}

#[async_trait]
impl ProxyApi for HttpProxyClient {
    async fn list(&self) -> Result<Value, FetchError> {
        self.call(Method::GET, None).await
    }

    async fn create(&self, fields: &Fields) -> Result<Value, FetchError> {
        self.call(Method::POST, Some(json!({ "fields": fields_to_json(fields) })))
            .await
    }

    async fn update(&self, id: &str, fields: &Fields) -> Result<Value, FetchError> {
        self.call(
            Method::PATCH,
            Some(json!({ "id": id, "fields": fields_to_json(fields) })),
        )
        .await
    }

    async fn delete(&self, id: &str) -> Result<Value, FetchError> {
        self.call(Method::DELETE, Some(json!({ "id": id }))).await
    }
}
