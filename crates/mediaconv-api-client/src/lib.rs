//! HTTP client for the media conversion service.
//!
//! Provides a minimal client with generic GET/send helpers that map every
//! failure onto [`ServiceError`], and domain methods (formats, upload, convert,
//! download) in [`api`]. The orchestrator and CLI use this client through the
//! [`ConversionService`](mediaconv_core::ConversionService) trait.

pub mod api;

use anyhow::{Context, Result};
use mediaconv_core::{ClientConfig, ServiceError};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// HTTP client for the conversion service.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Build a client. `timeout` of `None` leaves requests unbounded.
    pub fn new(base_url: String, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Self::new(config.backend_url.clone(), config.request_timeout())
    }

    /// Create client from environment: MEDIACONV_BACKEND_URL (or BACKEND_URL).
    pub fn from_env() -> Result<Self> {
        let config = ClientConfig::from_env().context("Failed to load client configuration")?;
        Self::from_config(&config)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET request with optional query parameters. Deserializes JSON response.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ServiceError> {
        let mut request = self.client.get(self.build_url(path));
        if !query.is_empty() {
            request = request.query(query);
        }
        self.send_json(request).await
    }

    /// Send a prepared request and deserialize the JSON body of a success response.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ServiceError> {
        let response = self.send(request).await?;
        response.json::<T>().await.map_err(|e| {
            ServiceError::Transport(format!("Failed to parse response as JSON: {}", e))
        })
    }

    /// Send a prepared request, turning non-success statuses into `ServiceError::Rejected`.
    pub async fn send(&self, request: RequestBuilder) -> Result<Response, ServiceError> {
        let response = request.send().await.map_err(|e| {
            tracing::debug!(error = %e, "Request to conversion service failed");
            ServiceError::Transport(e.to_string())
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = extract_detail(&body).unwrap_or_else(|| status.to_string());
        tracing::debug!(
            status = status.as_u16(),
            detail = %detail,
            "Conversion service rejected request"
        );
        Err(ServiceError::Rejected {
            status: status.as_u16(),
            detail,
        })
    }

    /// Raw client for custom requests.
    pub fn client(&self) -> &Client {
        &self.client
    }
}

/// Pull a human-readable message out of an error body.
///
/// The service answers `{"detail": "..."}`; validation errors carry a
/// structured `detail`, which is rendered as JSON. Any other non-empty body
/// is returned as-is.
fn extract_detail(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(serde_json::Value::Object(map)) => match map.get("detail") {
            Some(serde_json::Value::String(detail)) => Some(detail.clone()),
            Some(other) => Some(other.to_string()),
            None => Some(trimmed.to_string()),
        },
        _ => Some(trimmed.to_string()),
    }
}

// Re-export domain types for convenience.
pub use mediaconv_core::models::{
    ConversionReceipt, DownloadedArtifact, FormatTag, InputFile, SessionId, SupportedFormats,
    UploadReceipt,
};
