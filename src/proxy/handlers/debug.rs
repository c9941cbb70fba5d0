// Debug-only diagnostics
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Serialize;

use crate::constants::LOG_TAIL_MAX_BYTES;
use crate::proxy::common::tail_latest_log;
use crate::proxy::middleware::RequestId;
use crate::proxy::server::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CopilotLogsResponse {
    pub req_id: String,
    pub log_dir: String,
    pub tail: Option<String>,
}

/// GET /debug/copilot/logs. Hidden (plain 404) unless `DEBUG_ERRORS=1`.
pub async fn handle_debug_logs(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Response {
    if !state.config.debug_errors {
        return (StatusCode::NOT_FOUND, "not found").into_response();
    }

    let log_dir = &state.config.copilot_log_dir;
    Json(CopilotLogsResponse {
        req_id: req_id.to_string(),
        log_dir: log_dir.display().to_string(),
        tail: tail_latest_log(log_dir, LOG_TAIL_MAX_BYTES).await,
    })
    .into_response()
}
