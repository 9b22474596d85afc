// Client for the remote table API

use crate::config::RemoteConfig;
use crate::error::UpstreamError;
use async_trait::async_trait;
use eyre::{Result, eyre};
use reqwest::{Client, RequestBuilder, Url};
use serde_json::{Value, json};
use tracing::debug;

/// The four operations the proxy forwards.
///
/// Bodies are passed through as JSON so nothing about the remote schema is
/// assumed here.
#[async_trait]
pub trait TableBackend: Send + Sync {
    /// All records of the table, as the remote's `records` array
    async fn list(&self) -> Result<Value, UpstreamError>;

    async fn create(&self, fields: Value) -> Result<Value, UpstreamError>;

    /// Partial update; only the given fields change
    async fn update(&self, id: &str, fields: Value) -> Result<Value, UpstreamError>;

    async fn delete(&self, id: &str) -> Result<Value, UpstreamError>;
}

/// Airtable REST client for one table
#[derive(Clone)]
pub struct AirtableClient {
    http: Client,
    resource: Url,
    api_key: String,
}

impl AirtableClient {
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let http = Client::builder().build()?;
        Self::with_client(http, config)
    }

    pub fn with_client(http: Client, config: &RemoteConfig) -> Result<Self> {
        let mut resource: Url = config.api_url.parse()?;
        resource
            .path_segments_mut()
            .map_err(|_| eyre!("API URL cannot be a base: {}", config.api_url))?
            .pop_if_empty()
            .push(&config.base_id)
            .push(&config.table_name);

        Ok(Self {
            http,
            resource,
            api_key: config.api_key.clone(),
        })
    }

    /// URL of the table resource
    pub fn resource(&self) -> &Url {
        &self.resource
    }

    /// URL of one record in the table
    pub fn record_url(&self, id: &str) -> Url {
        let mut url = self.resource.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push(id);
        }
        url
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value, UpstreamError> {
        let response = request.bearer_auth(&self.api_key).send().await?;
        let status = response.status();
        let body = response.text().await?;

        let parsed = if body.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&body).unwrap_or(Value::String(body))
        };

        if status.is_success() {
            debug!(status = status.as_u16(), "Remote call succeeded");
            Ok(parsed)
        } else {
            Err(UpstreamError::Status {
                status: status.as_u16(),
                details: parsed,
            })
        }
    }
}

#[async_trait]
impl TableBackend for AirtableClient {
    async fn list(&self) -> Result<Value, UpstreamError> {
        let mut page = self.send(self.http.get(self.resource.clone())).await?;
        Ok(page
            .get_mut("records")
            .map(Value::take)
            .unwrap_or_else(|| Value::Array(Vec::new())))
    }

    async fn create(&self, fields: Value) -> Result<Value, UpstreamError> {
        self.send(self.http.post(self.resource.clone()).json(&json!({ "fields": fields })))
            .await
    }

    async fn update(&self, id: &str, fields: Value) -> Result<Value, UpstreamError> {
        self.send(self.http.patch(self.record_url(id)).json(&json!({ "fields": fields })))
            .await
    }

    async fn delete(&self, id: &str) -> Result<Value, UpstreamError> {
        self.send(self.http.delete(self.record_url(id))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(api_url: &str, table: &str) -> RemoteConfig {
        RemoteConfig {
            api_key: "key".to_string(),
            base_id: "appXYZ".to_string(),
            table_name: table.to_string(),
            api_url: api_url.to_string(),
        }
    }

    #[test]
    fn test_resource_url() {
        let client = AirtableClient::new(&config("https://api.airtable.com/v0", "Haberler")).unwrap();
        assert_eq!(client.resource().as_str(), "https://api.airtable.com/v0/appXYZ/Haberler");
    }

    #[test]
    fn test_resource_url_trailing_slash_and_encoding() {
        let client = AirtableClient::new(&config("https://api.airtable.com/v0/", "Müşteri Listesi")).unwrap();
        assert_eq!(
            client.resource().as_str(),
            "https://api.airtable.com/v0/appXYZ/M%C3%BC%C5%9Fteri%20Listesi"
        );
    }

    #[test]
    fn test_record_url() {
        let client = AirtableClient::new(&config("https://api.airtable.com/v0", "News")).unwrap();
        assert_eq!(
            client.record_url("rec123").as_str(),
            "https://api.airtable.com/v0/appXYZ/News/rec123"
        );
    }

    #[test]
    fn test_invalid_api_url() {
        assert!(AirtableClient::new(&config("not a url", "News")).is_err());
        assert!(AirtableClient::new(&config("mailto:someone@example.com", "News")).is_err());
    }

    #[tokio::test]
    async fn test_transport_failure_is_upstream_error() {
        // Port 9 on localhost is not expected to accept connections
        let client = AirtableClient::new(&config("http://127.0.0.1:9/v0", "News")).unwrap();
        let err = client.list().await.unwrap_err();
        assert!(matches!(err, UpstreamError::Transport(_)));
    }
}
