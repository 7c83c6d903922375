//! Reprocessing backend client
//!
//! Sends normalized retry envelopes upstream as
//! `POST {base_url}/update?priority=<bool>` with a JSON body.
//!
//! Transport, authentication header and surfacing upstream errors are the
//! only concerns here; the envelope is built and validated beforehand.

use arcon_common::config::ServiceConfig;
use arcon_common::retry::RetryEnvelope;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Failed to build HTTP client: {0}")]
    Setup(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

/// HTTP client for the reprocessing backend
pub struct BackendClient {
    http_client: Client,
    base_url: String,
    token: Option<String>,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration, token: Option<String>) -> Result<Self, BackendError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Setup(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn from_config(config: &ServiceConfig) -> Result<Self, BackendError> {
        Self::new(
            config.backend_url.clone(),
            config.request_timeout,
            config.backend_token.clone(),
        )
    }

    pub fn update_url(&self) -> String {
        format!("{}/update", self.base_url)
    }

    /// Submit a retry envelope
    ///
    /// Returns the backend's JSON response body (`Value::Null` when empty,
    /// a JSON string when the body is not JSON).
    pub async fn submit(&self, envelope: &RetryEnvelope, priority: bool) -> Result<Value, BackendError> {
        debug!(task = %envelope.task, priority, "Submitting retry request");

        let mut request = self
            .http_client
            .post(self.update_url())
            .query(&[("priority", priority)])
            .json(envelope);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| BackendError::Network(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            warn!(task = %envelope.task, status = status.as_u16(), "Backend rejected retry request");
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        info!(task = %envelope.task, priority, "Retry request accepted by backend");

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body).unwrap_or(Value::String(body)))
    }
}
