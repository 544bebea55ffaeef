//! REST client for the hosted backend.
//!
//! Procedures are called through `POST /rest/v1/rpc/{name}` and objects are
//! removed through `DELETE /storage/v1/object/{bucket}`. Both requests carry
//! the service key as `apikey` and as a bearer token.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::{json, Value};
use tracing::debug;

use super::{ExpiredAudioListing, ObjectStorage, RetentionBackend};
use crate::config::BackendConfig;
use crate::errors::{BackendError, Error, Result};
use crate::secrets::SecretString;

const REMOVE_OPERATION: &str = "remove";
const MAX_ERROR_BODY: usize = 512;

/// Production implementation of [`RetentionBackend`] and [`ObjectStorage`].
pub struct RestBackendClient {
    client: Client,
    base_url: String,
    service_key: SecretString,
    listing_procedure: String,
}

impl RestBackendClient {
    /// Create a client for `config`, calling `listing_procedure` for listings.
    pub fn new(config: &BackendConfig, listing_procedure: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("consult-sweeper/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            service_key: config.service_key.clone(),
            listing_procedure: listing_procedure.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let key = self.service_key.expose_secret();
        request.header("apikey", key).bearer_auth(key)
    }

    async fn send(&self, operation: &str, request: RequestBuilder) -> std::result::Result<Response, BackendError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| BackendError::transport(operation, e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(BackendError::status(operation, status.as_u16(), truncate(&body, MAX_ERROR_BODY)))
    }
}

#[async_trait]
impl RetentionBackend for RestBackendClient {
    async fn list_expired_audio(&self) -> std::result::Result<ExpiredAudioListing, BackendError> {
        let operation = self.listing_procedure.as_str();
        let url = format!("{}/rest/v1/rpc/{}", self.base_url, operation);
        debug!(url = %url, "Calling listing procedure");

        let response = self.send(operation, self.client.post(&url).json(&json!({}))).await?;

        let value: Value = response
            .json()
            .await
            .map_err(|e| BackendError::decode(operation, e.to_string()))?;

        decode_listing(operation, value)
    }
}

#[async_trait]
impl ObjectStorage for RestBackendClient {
    async fn remove(&self, bucket: &str, paths: &[String]) -> std::result::Result<(), BackendError> {
        let url = format!("{}/storage/v1/object/{}", self.base_url, bucket);
        debug!(url = %url, count = paths.len(), "Removing objects");

        self.send(REMOVE_OPERATION, self.client.delete(&url).json(&json!({ "prefixes": paths })))
            .await?;

        Ok(())
    }
}

/// Accept both `{...}` and `[{...}]` (set-returning procedures).
fn decode_listing(operation: &str, value: Value) -> std::result::Result<ExpiredAudioListing, BackendError> {
    let value = match value {
        Value::Array(mut rows) => match rows.len() {
            0 => return Ok(ExpiredAudioListing::default()),
            1 => rows.remove(0),
            n => {
                return Err(BackendError::decode(
                    operation,
                    format!("expected a single result row, got {}", n),
                ))
            }
        },
        other => other,
    };

    serde_json::from_value(value).map_err(|e| BackendError::decode(operation, e.to_string()))
}

fn truncate(body: &str, max: usize) -> String {
    if body.len() <= max {
        return body.to_string();
    }
    let mut end = max;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
