// Model listing
use axum::{
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
    Extension, Json,
};
use tracing::debug;

use super::common::{upstream_failure, OpenAiError, UpstreamRoute};
use crate::proxy::common::{bearer_token, ensure_dir, resolve_credential};
use crate::proxy::mappers::openai::{build_model_list, ModelList};
use crate::proxy::middleware::RequestId;
use crate::proxy::server::AppState;
use crate::proxy::upstream::{ClientOptions, CopilotClient, SdkError};

/// GET /models
pub async fn handle_list_models(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    headers: HeaderMap,
) -> Response {
    let Some(mode) = resolve_credential(bearer_token(&headers), state.config.allow_logged_in_user)
    else {
        return OpenAiError::missing_api_key().into_response();
    };

    let client = state.copilot.create(ClientOptions {
        credential: mode.clone(),
    });

    ensure_dir(&state.config.copilot_log_dir).await;
    let response = match fetch_models(client.as_ref()).await {
        Ok(list) => Json(list).into_response(),
        Err(err) => upstream_failure(&state, &req_id, UpstreamRoute::Models, &mode, &err)
            .await
            .into_response(),
    };

    if let Err(e) = client.stop().await {
        debug!("[{}] Ignoring Copilot client stop failure: {}", req_id, e);
    }
    response
}

async fn fetch_models(client: &dyn CopilotClient) -> Result<ModelList, SdkError> {
    client.start().await?;
    let models = client.list_models().await?;
    Ok(build_model_list(&models))
}
