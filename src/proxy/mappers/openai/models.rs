// OpenAI data models

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Inbound `/chat/completions` body. Fields stay loosely typed so validation can
/// answer with OpenAI-style errors instead of deserializer rejections.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatCompletionRequest {
    #[serde(default)]
    pub model: Option<Value>,
    #[serde(default)]
    pub messages: Option<Value>,
    #[serde(default)]
    pub stream: Option<Value>,
}

impl ChatCompletionRequest {
    /// Non-object bodies are treated as empty.
    pub fn from_value(body: Value) -> Self {
        if body.is_object() {
            serde_json::from_value(body).unwrap_or_default()
        } else {
            Self::default()
        }
    }

    pub fn wants_stream(&self) -> bool {
        matches!(self.stream, Some(Value::Bool(true)))
    }

    /// Trimmed model name, or `default` when absent, blank or not a string.
    pub fn resolved_model(&self, default: &str) -> String {
        match &self.model {
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            _ => default.to_string(),
        }
    }

    /// The raw `messages` value, only when it is a non-empty array.
    pub fn non_empty_messages(&self) -> Option<&Value> {
        self.messages
            .as_ref()
            .filter(|v| v.as_array().is_some_and(|items| !items.is_empty()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<MessageContent>,
}

impl ChatMessage {
    /// Reads `role` and `content` independently so one odd field never drops the other.
    /// A non-string role is kept as its JSON text; non-objects become an empty user message.
    pub fn from_value(value: &Value) -> Self {
        let role = match value.get("role") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        };
        let content = value
            .get("content")
            .filter(|c| !c.is_null())
            .and_then(|c| serde_json::from_value(c.clone()).ok());
        Self { role, content }
    }

    pub fn role(&self) -> &str {
        self.role.as_deref().unwrap_or("user")
    }

    pub fn text(&self) -> String {
        self.content.as_ref().map(MessageContent::text).unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    String(String),
    Parts(Vec<ContentPart>),
    Other(Value),
}

impl MessageContent {
    pub fn text(&self) -> String {
        match self {
            MessageContent::String(s) => s.clone(),
            MessageContent::Parts(parts) => parts
                .iter()
                .filter(|p| p.is_text())
                .filter_map(|p| p.text.as_deref())
                .collect::<Vec<_>>()
                .join(""),
            MessageContent::Other(Value::Null) => String::new(),
            MessageContent::Other(other) => other.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentPart {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

impl ContentPart {
    /// Untyped parts count as text.
    pub fn is_text(&self) -> bool {
        self.kind.as_deref().map_or(true, |k| k == "text")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionResponse {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<Choice>,
    /// Copilot exposes no token accounting; always serialized as `null`.
    pub usage: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    pub index: u32,
    pub message: AssistantMessage,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelList {
    pub object: String,
    pub data: Vec<ModelCard>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelCard {
    pub id: String,
    pub object: String,
    pub owned_by: String,
}
