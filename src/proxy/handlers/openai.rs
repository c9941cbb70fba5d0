// OpenAI-compatible chat completions
use axum::{
    extract::{rejection::BytesRejection, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use bytes::Bytes;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use super::common::{upstream_failure, ErrorCode, OpenAiError, UpstreamRoute};
use crate::constants::{DEFAULT_MODEL, MAX_BODY_BYTES};
use crate::proxy::common::{bearer_token, ensure_dir, resolve_credential, CredentialMode};
use crate::proxy::mappers::openai::{
    build_chat_completion, extract_reply_content, messages_value_to_prompt, ChatCompletionRequest,
};
use crate::proxy::middleware::RequestId;
use crate::proxy::server::AppState;
use crate::proxy::upstream::{ClientOptions, CopilotClient, SdkError};

/// POST /chat/completions
pub async fn handle_chat_completions(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let Some(mode) = resolve_credential(bearer_token(&headers), state.config.allow_logged_in_user)
    else {
        return OpenAiError::missing_api_key().into_response();
    };

    let request = match body.map_err(body_rejection).and_then(|body| parse_body(&body)) {
        Ok(request) => request,
        Err(err) => return err.into_response(),
    };

    if request.wants_stream() {
        return OpenAiError::new(
            ErrorCode::UnsupportedParameter,
            "Streaming is not supported by this provider.",
        )
        .with_param("stream")
        .into_response();
    }

    let chosen_model = request.resolved_model(DEFAULT_MODEL);

    let Some(messages) = request.non_empty_messages() else {
        return OpenAiError::new(ErrorCode::InvalidRequest, "Field 'messages' must be a non-empty array.")
            .with_param("messages")
            .into_response();
    };

    let prompt = messages_value_to_prompt(messages);
    if prompt.trim().is_empty() {
        return OpenAiError::new(ErrorCode::InvalidRequest, "Messages produced an empty prompt.")
            .with_param("messages")
            .into_response();
    }

    let client = state.copilot.create(ClientOptions {
        credential: mode.clone(),
    });
    let outcome = converse(client.as_ref(), &state, &req_id, &mode, &chosen_model, &prompt).await;

    let response = match outcome {
        Ok(content) => Json(build_chat_completion(&chosen_model, content)).into_response(),
        Err(err) => {
            upstream_failure(&state, &req_id, UpstreamRoute::ChatCompletions, &mode, &err)
                .await
                .into_response()
        }
    };

    if let Err(e) = client.stop().await {
        debug!("[{}] Ignoring Copilot client stop failure: {}", req_id, e);
    }
    response
}

/// Body read failures (oversized included) stay inside the OpenAI error shape.
fn body_rejection(rejection: BytesRejection) -> OpenAiError {
    let message = if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        format!("Request body exceeds the {} byte limit.", MAX_BODY_BYTES)
    } else {
        "Failed to read request body.".to_string()
    };
    OpenAiError::new(ErrorCode::InvalidRequest, message)
}

/// Empty bodies count as `{}`; anything else must be JSON.
fn parse_body(body: &Bytes) -> Result<ChatCompletionRequest, OpenAiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ChatCompletionRequest::default());
    }
    serde_json::from_slice::<Value>(body)
        .map(ChatCompletionRequest::from_value)
        .map_err(|_| OpenAiError::new(ErrorCode::InvalidRequest, "Request body must be valid JSON."))
}

/// One start → session → prompt → reply exchange. The session is destroyed on every path.
async fn converse(
    client: &dyn CopilotClient,
    state: &AppState,
    req_id: &RequestId,
    mode: &CredentialMode,
    model: &str,
    prompt: &str,
) -> Result<String, SdkError> {
    ensure_dir(&state.config.copilot_log_dir).await;
    client.start().await?;

    let session = client.create_session(model).await?;

    // Prompt text may be sensitive: log only its size and a fingerprint
    info!(
        reqId = %req_id,
        route = UpstreamRoute::ChatCompletions.path(),
        mode = mode.as_str(),
        chosenModel = model,
        promptBytes = prompt.len(),
        promptHash = %prompt_fingerprint(prompt),
        "Submitting prompt"
    );

    let reply = session.send_and_wait(prompt).await;

    if let Err(e) = session.destroy().await {
        debug!("[{}] Ignoring session {} destroy failure: {}", req_id, session.id(), e);
    }

    Ok(extract_reply_content(&reply?))
}

/// First 12 hex chars of the prompt's SHA-256.
pub fn prompt_fingerprint(prompt: &str) -> String {
    let digest = format!("{:x}", Sha256::digest(prompt.as_bytes()));
    digest[..12].to_string()
}
