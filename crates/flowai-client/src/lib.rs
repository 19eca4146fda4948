//! Thin REST client for the flowai workflow API.
//!
//! Holds connection configuration (API key, base URL) and exposes a
//! small surface over the workflow endpoints: a deployment-status
//! lookup, a fail-closed deployment gate, and workflow execution.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::env;

pub const DEFAULT_BASE_URL: &str = "https://flowai.app";

#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    pub api_key: String,
    pub base_url: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("config error: {0}")]
    Config(String),
    #[error("{message}")]
    Api {
        message: String,
        code: Option<String>,
        status: Option<u16>,
    },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("request timeout: {0}")]
    Timeout(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_timeout() {
            return Self::Timeout(value.to_string());
        }
        Self::Transport(value.to_string())
    }
}

/// Deployment status of one workflow. `is_deployed` is the only field
/// with defined meaning; the remaining fields are carried through as
/// the remote reports them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStatus {
    pub is_deployed: bool,
    #[serde(default)]
    pub deployed_at: Option<String>,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub needs_redeployment: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowExecutionResult {
    pub success: bool,
    #[serde(default)]
    pub output: Value,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub duration_ms: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct WorkflowClient {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl WorkflowClient {
    pub fn new(config: ClientConfig) -> Self {
        let base_url = config
            .base_url
            .as_deref()
            .map(strip_trailing_slash)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self {
            api_key: config.api_key,
            base_url,
            client: reqwest::Client::new(),
        }
    }

    /// Reads `FLOWAI_API_KEY` (required) and `FLOWAI_BASE_URL`
    /// (optional override).
    pub fn from_env() -> Result<Self, ClientError> {
        let api_key = env::var("FLOWAI_API_KEY")
            .map_err(|_| ClientError::Config("FLOWAI_API_KEY is not set".to_string()))?;
        Ok(Self::new(ClientConfig {
            api_key,
            base_url: env::var("FLOWAI_BASE_URL").ok(),
        }))
    }

    pub fn set_api_key(&mut self, api_key: impl Into<String>) {
        self.api_key = api_key.into();
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Stores the base URL with at most one trailing `/` stripped.
    pub fn set_base_url(&mut self, base_url: impl Into<String>) {
        self.base_url = strip_trailing_slash(&base_url.into());
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn workflow_status(&self, workflow_id: &str) -> Result<WorkflowStatus, ClientError> {
        let url = format!("{}/api/workflows/{}/status", self.base_url, workflow_id);
        let response = self
            .client
            .get(&url)
            .header("x-api-key", &self.api_key)
            .send()
            .await?;

        let status = response.status();
        let payload = response.json::<Value>().await.map_err(|e| {
            ClientError::InvalidResponse(format!("failed to parse status response: {e}"))
        })?;
        if !status.is_success() {
            return Err(api_error(status.as_u16(), &payload));
        }

        serde_json::from_value(payload)
            .map_err(|e| ClientError::InvalidResponse(format!("malformed status payload: {e}")))
    }

    /// Deployment gate: `true` only when the remote reports the
    /// workflow as deployed. Every failure mode collapses to `false`;
    /// no error escapes.
    pub async fn validate_workflow(&self, workflow_id: &str) -> bool {
        match self.workflow_status(workflow_id).await {
            Ok(status) => status.is_deployed,
            Err(error) => {
                tracing::debug!(workflow_id, %error, "workflow validation failed");
                false
            }
        }
    }

    pub async fn execute_workflow(
        &self,
        workflow_id: &str,
        input: Value,
    ) -> Result<WorkflowExecutionResult, ClientError> {
        let url = format!("{}/api/workflows/{}/execute", self.base_url, workflow_id);
        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .json(&input)
            .send()
            .await?;

        let status = response.status();
        let payload = response.json::<Value>().await.map_err(|e| {
            ClientError::InvalidResponse(format!("failed to parse execution response: {e}"))
        })?;
        if !status.is_success() {
            return Err(api_error(status.as_u16(), &payload));
        }

        serde_json::from_value(payload)
            .map_err(|e| ClientError::InvalidResponse(format!("malformed execution payload: {e}")))
    }
}

fn strip_trailing_slash(url: &str) -> String {
    url.strip_suffix('/').unwrap_or(url).to_string()
}

fn api_error(status: u16, payload: &Value) -> ClientError {
    let message = payload
        .get("message")
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
        .or_else(|| {
            payload
                .get("error")
                .and_then(Value::as_str)
                .filter(|text| !text.is_empty())
        })
        .unwrap_or("workflow API request failed")
        .to_string();
    let code = payload
        .get("code")
        .and_then(Value::as_str)
        .map(ToString::to_string)
        .or_else(|| match status {
            401 | 403 => Some("UNAUTHORIZED".to_string()),
            404 => Some("NOT_FOUND".to_string()),
            _ => None,
        });
    ClientError::Api {
        message,
        code,
        status: Some(status),
    }
}
