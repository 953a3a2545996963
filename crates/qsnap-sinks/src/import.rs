//! Client for the local question-library import endpoint
//!
//! The endpoint takes `POST {id, imageBase64, token}` as JSON. Any 2xx is a
//! success; the response body is only logged.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use qsnap_core::CaptureResult;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRequest {
    pub id: String,
    /// PNG as a `data:` URL
    #[serde(rename = "imageBase64")]
    pub image_base64: String,
    pub token: String,
}

impl ImportRequest {
    pub fn new(id: impl Into<String>, image: &CaptureResult, token: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            image_base64: data_url(&image.png),
            token: token.into(),
        }
    }
}

/// Encode a PNG payload as a `data:image/png;base64,` URL.
pub fn data_url(png: &[u8]) -> String {
    format!("data:{};base64,{}", CaptureResult::MIME_TYPE, STANDARD.encode(png))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportResponse {
    pub status: u16,
    pub body: String,
}

impl ImportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Failed to create HTTP client: {0}")]
    Client(String),

    #[error("Request to {endpoint} failed: {message}")]
    Request { endpoint: String, message: String },
}

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Import endpoint returned HTTP {status}")]
    Status { status: u16, body: String },

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Delivers import requests to the library.
#[async_trait]
pub trait ImportTransport: Send + Sync {
    async fn submit(&self, request: &ImportRequest) -> Result<ImportResponse, TransportError>;
}

/// Map an endpoint response to an import outcome.
pub fn classify(response: ImportResponse) -> Result<(), ImportError> {
    if response.is_success() {
        debug!(status = response.status, "Import accepted");
        return Ok(());
    }
    warn!(
        status = response.status,
        body = %response.body,
        "Import rejected by endpoint"
    );
    Err(ImportError::Status {
        status: response.status,
        body: response.body,
    })
}

/// JSON-over-HTTP transport
#[derive(Debug, Clone)]
pub struct HttpImportClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpImportClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("qsnap/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ImportTransport for HttpImportClient {
    async fn submit(&self, request: &ImportRequest) -> Result<ImportResponse, TransportError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| TransportError::Request {
                endpoint: self.endpoint.clone(),
                message: e.to_string(),
            })?;

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();

        Ok(ImportResponse { status, body })
    }
}
