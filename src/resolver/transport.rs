//! HTTP transport for JSON-RPC bodies

use super::ClientOptions;
use crate::error::{TransportError, WasmTrpError};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use std::time::Duration;

/// Sends one JSON-RPC request body and returns the raw response body
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, body: Value) -> Result<Value, TransportError>;
}

/// reqwest-backed transport with a per-request timeout and fixed headers
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(options: &ClientOptions) -> Result<Self, WasmTrpError> {
        let mut headers = HeaderMap::new();
        for (name, value) in &options.headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                WasmTrpError::InvalidInput(format!("Invalid header name {}: {}", name, e))
            })?;
            let value = HeaderValue::from_str(value).map_err(|e| {
                WasmTrpError::InvalidInput(format!("Invalid header value for {}: {}", name, e))
            })?;
            headers.insert(name, value);
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(options.timeout_ms))
            .default_headers(headers)
            .build()
            .map_err(|e| WasmTrpError::InvalidInput(format!("Failed to build HTTP client: {}", e)))?;

        Ok(HttpTransport {
            client,
            endpoint: options.endpoint.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, body: Value) -> Result<Value, TransportError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(classify)?;
        serde_json::from_slice(&bytes).map_err(|e| {
            TransportError::Malformed(format!("HTTP {} with non-JSON body: {}", status, e))
        })
    }
}

fn classify(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_connect() {
        TransportError::Unreachable(err.to_string())
    } else {
        TransportError::Malformed(err.to_string())
    }
}
