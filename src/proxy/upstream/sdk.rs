// Copilot client seam
// Handlers only ever talk to these traits; the HTTP implementation lives in `client.rs`.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::proxy::common::CredentialMode;

/// Longest upstream body excerpt carried in an error message.
const MAX_MESSAGE_BODY_CHARS: usize = 500;

#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub credential: CredentialMode,
}

/// Builds one client per request.
pub trait CopilotClientFactory: Send + Sync {
    fn create(&self, options: ClientOptions) -> Box<dyn CopilotClient>;
}

#[async_trait]
pub trait CopilotClient: Send + Sync {
    async fn start(&self) -> Result<(), SdkError>;

    async fn stop(&self) -> Result<(), SdkError>;

    /// Raw model descriptors; shape varies, see `mappers::openai::response::model_id`.
    async fn list_models(&self) -> Result<Vec<Value>, SdkError>;

    async fn create_session(&self, model: &str) -> Result<Box<dyn CopilotSession>, SdkError>;
}

#[async_trait]
pub trait CopilotSession: Send + Sync {
    fn id(&self) -> &str;

    /// Submits one prompt and waits for the final assistant event.
    async fn send_and_wait(&self, prompt: &str) -> Result<Value, SdkError>;

    async fn destroy(&self) -> Result<(), SdkError>;
}

/// Transport-level details of a failed upstream call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: BTreeMap<String, String>,
    /// Parsed JSON when possible, raw text otherwise.
    pub data: Value,
}

/// Error raised by a Copilot client. Serializes into the error-like shape `normalize` consumes.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[error("{message}")]
pub struct SdkError {
    pub name: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<UpstreamResponse>,
}

impl SdkError {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            code: None,
            status: None,
            response: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn not_started() -> Self {
        Self::new("StateError", "Copilot client is not started").with_code("not_started")
    }

    /// Network-level failure (DNS, connect, timeout, body read).
    pub fn transport(context: &str, err: &reqwest::Error) -> Self {
        let code = if err.is_timeout() {
            "ETIMEDOUT"
        } else if err.is_connect() {
            "ECONNREFUSED"
        } else {
            "ETRANSPORT"
        };
        let mut out = Self::new("TransportError", format!("{}: {}", context, err)).with_code(code);
        out.status = err.status().map(|s| s.as_u16());
        out
    }

    /// Upstream answered with a non-success status.
    pub fn http(
        context: &str,
        status: u16,
        status_text: &str,
        headers: BTreeMap<String, String>,
        body: &str,
    ) -> Self {
        let data = serde_json::from_str::<Value>(body)
            .unwrap_or_else(|_| Value::String(body.to_string()));
        let detail = upstream_message(&data);

        let mut message = format!("{}: {} {}", context, status, status_text)
            .trim_end()
            .to_string();
        if let Some(detail) = detail {
            message.push_str(" - ");
            message.push_str(&detail);
        }

        Self {
            name: "HttpError".to_string(),
            message,
            code: None,
            status: Some(status),
            response: Some(UpstreamResponse {
                status,
                status_text: status_text.to_string(),
                headers,
                data,
            }),
        }
    }

    pub fn decode(context: &str, err: impl std::fmt::Display) -> Self {
        Self::new("DecodeError", format!("{}: {}", context, err)).with_code("EDECODE")
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Pulls a human-readable message out of an upstream error body.
fn upstream_message(data: &Value) -> Option<String> {
    let candidate = ["/message", "/error/message", "/error"]
        .iter()
        .find_map(|ptr| data.pointer(ptr).and_then(Value::as_str))
        .map(str::to_string)
        .or_else(|| data.as_str().map(str::to_string))?;

    let trimmed = candidate.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(MAX_MESSAGE_BODY_CHARS).collect())
}
