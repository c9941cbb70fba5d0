// Copilot reply → OpenAI response
use super::models::*;

use serde_json::Value;

use crate::constants::MODEL_OWNER;

/// Where the assistant text may live in a session reply, in priority order.
/// `/data/content` is the canonical `assistant.message` field.
const CONTENT_POINTERS: [&str; 4] = ["/data/content", "/data/message", "/content", "/data"];

/// Where a model descriptor keeps its identifier, in priority order.
const MODEL_ID_FIELDS: [&str; 3] = ["id", "model", "name"];

/// First non-null candidate; strings verbatim, anything else as JSON text.
pub fn extract_reply_content(reply: &Value) -> String {
    CONTENT_POINTERS
        .iter()
        .find_map(|ptr| reply.pointer(ptr).filter(|v| !v.is_null()))
        .map(value_text)
        .unwrap_or_default()
}

pub fn build_chat_completion(model: &str, content: String) -> ChatCompletionResponse {
    ChatCompletionResponse {
        id: format!("chatcmpl-{}", uuid::Uuid::new_v4()),
        object: "chat.completion".to_string(),
        created: chrono::Utc::now().timestamp(),
        model: model.to_string(),
        choices: vec![Choice {
            index: 0,
            message: AssistantMessage {
                role: "assistant".to_string(),
                content,
            },
            finish_reason: Some("stop".to_string()),
        }],
        usage: None,
    }
}

pub fn model_id(model: &Value) -> String {
    MODEL_ID_FIELDS
        .iter()
        .find_map(|field| model.get(*field).filter(|v| !v.is_null()))
        .map(value_text)
        .unwrap_or_else(|| value_text(model))
}

pub fn build_model_list(models: &[Value]) -> ModelList {
    ModelList {
        object: "list".to_string(),
        data: models
            .iter()
            .map(|m| ModelCard {
                id: model_id(m),
                object: "model".to_string(),
                owned_by: MODEL_OWNER.to_string(),
            })
            .collect(),
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
