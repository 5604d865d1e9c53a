//! Execution Service - Boundary to the Remote Code Runner
//!
//! **Core Responsibility:**
//! Carry run, submit and MCQ requests to the execution backend and hand back
//! its payloads unchanged.
//!
//! **Critical Architectural Boundary:**
//! - The service knows HOW to reach the backend (HTTP, in-process fake, ...)
//! - The service does NOT reconcile results or touch workspace state
//! - The service does NOT enforce the request timeout; the controller does
//!
//! **Error classes:**
//! - `ServiceError::Transport`: no usable response (connect failure, bad body)
//! - `ServiceError::Api`: the backend answered with non-2xx or `success: false`

use std::time::Duration;

use async_trait::async_trait;
use codelab_common::config::ClientConfig;
use codelab_common::types::{
    ApiEnvelope, McqSubmitRequest, RunData, RunRequest, SubmitData, SubmitRequest,
};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::ServiceError;

#[async_trait]
pub trait ExecutionService: Send + Sync {
    async fn run(&self, request: &RunRequest) -> Result<RunData, ServiceError>;

    async fn submit(&self, request: &SubmitRequest) -> Result<SubmitData, ServiceError>;

    async fn submit_mcq(&self, request: &McqSubmitRequest) -> Result<(), ServiceError>;
}

/// JSON-over-HTTP execution backend
#[derive(Debug, Clone)]
pub struct HttpExecutionService {
    client: Client,
    config: ClientConfig,
}

impl HttpExecutionService {
    pub fn new(config: ClientConfig) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ServiceError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    async fn post_json<B, T>(&self, url: &str, body: &B) -> Result<Option<T>, ServiceError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned + Send,
    {
        debug!(url = %url, "Calling execution service");

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| ServiceError::Transport(format!("Failed to reach execution service: {}", e)))?;

        let status = response.status();
        let raw_body = response
            .text()
            .await
            .map_err(|e| ServiceError::Transport(format!("Failed to read execution service response: {}", e)))?;

        let parsed: Option<Value> = serde_json::from_str(&raw_body).ok();

        if !status.is_success() {
            let detail = parsed
                .as_ref()
                .and_then(extract_error_message)
                .unwrap_or_else(|| raw_body.trim().to_string());
            warn!(url = %url, status = status.as_u16(), detail = %detail, "Execution service rejected request");
            return Err(ServiceError::Api(format!(
                "Execution service returned {}: {}",
                status.as_u16(),
                detail
            )));
        }

        let parsed = parsed.ok_or_else(|| {
            ServiceError::Transport("Execution service returned a non-JSON body".to_string())
        })?;

        let envelope: ApiEnvelope<T> = serde_json::from_value(parsed)
            .map_err(|e| ServiceError::Transport(format!("Unexpected execution service response: {}", e)))?;

        if !envelope.success {
            let message = envelope
                .message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| "Execution service reported a failure".to_string());
            return Err(ServiceError::Api(message));
        }

        Ok(envelope.data)
    }
}

fn extract_error_message(value: &Value) -> Option<String> {
    ["message", "error", "detail"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

#[async_trait]
impl ExecutionService for HttpExecutionService {
    async fn run(&self, request: &RunRequest) -> Result<RunData, ServiceError> {
        let data: Option<RunData> = self.post_json(&self.config.run_url(), request).await?;
        Ok(data.unwrap_or_default())
    }

    async fn submit(&self, request: &SubmitRequest) -> Result<SubmitData, ServiceError> {
        let data: Option<SubmitData> = self.post_json(&self.config.submit_url(), request).await?;
        data.ok_or_else(|| ServiceError::Api("Submission response did not include a result".to_string()))
    }

    async fn submit_mcq(&self, request: &McqSubmitRequest) -> Result<(), ServiceError> {
        let _: Option<Value> = self.post_json(&self.config.mcq_url(), request).await?;
        Ok(())
    }
}
