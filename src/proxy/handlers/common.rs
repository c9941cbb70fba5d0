use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::error;

use crate::constants::LOG_TAIL_MAX_BYTES;
use crate::proxy::common::{normalize, tail_latest_log, CredentialMode, NormalizedError};
use crate::proxy::middleware::RequestId;
use crate::proxy::server::AppState;
use crate::proxy::upstream::SdkError;

/// Every error body carries this `type`, whatever the code.
pub const ERROR_TYPE: &str = "invalid_request_error";

static AUTH_FAILURE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)unauthorized|forbidden|bad credentials|invalid token").expect("valid regex")
});

// ===== Error taxonomy =====

/// Client-visible error codes. Each one maps to exactly one HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidRequest,
    MissingApiKey,
    InvalidApiKey,
    Forbidden,
    ServerError,
    UnsupportedParameter,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidRequest => "invalid_request",
            ErrorCode::MissingApiKey => "missing_api_key",
            ErrorCode::InvalidApiKey => "invalid_api_key",
            ErrorCode::Forbidden => "forbidden",
            ErrorCode::ServerError => "server_error",
            ErrorCode::UnsupportedParameter => "unsupported_parameter",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::InvalidRequest | ErrorCode::UnsupportedParameter => StatusCode::BAD_REQUEST,
            ErrorCode::MissingApiKey | ErrorCode::InvalidApiKey => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::ServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub code: &'static str,
    pub param: Option<String>,
}

/// Diagnostics attached only when `DEBUG_ERRORS=1`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDebug {
    pub req_id: String,
    pub mode: &'static str,
    pub error: NormalizedError,
    pub copilot_cli_log_tail: Option<String>,
    pub hint: &'static str,
}

#[derive(Debug, Serialize)]
pub struct OpenAiErrorBody {
    pub error: ErrorDetail,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<ErrorDebug>,
}

/// An OpenAI-style error response.
#[derive(Debug)]
pub struct OpenAiError {
    pub status: StatusCode,
    pub body: OpenAiErrorBody,
}

impl OpenAiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status: code.status(),
            body: OpenAiErrorBody {
                error: ErrorDetail {
                    message: message.into(),
                    kind: ERROR_TYPE,
                    code: code.as_str(),
                    param: None,
                },
                debug: None,
            },
        }
    }

    pub fn with_param(mut self, param: &str) -> Self {
        self.body.error.param = Some(param.to_string());
        self
    }

    /// Attaches the debug payload only when debug errors are enabled.
    pub fn with_debug(mut self, enabled: bool, debug: ErrorDebug) -> Self {
        if enabled {
            self.body.debug = Some(debug);
        }
        self
    }

    pub fn missing_api_key() -> Self {
        Self::new(
            ErrorCode::MissingApiKey,
            "Missing Authorization: Bearer <token> (or set ALLOW_LOGGED_IN_USER=1 for server-side Copilot login).",
        )
    }
}

impl IntoResponse for OpenAiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

// ===== Upstream failure policy =====

/// Which endpoint hit the upstream failure; the models route has a narrower policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamRoute {
    Models,
    ChatCompletions,
}

impl UpstreamRoute {
    pub fn path(&self) -> &'static str {
        match self {
            UpstreamRoute::Models => "/models",
            UpstreamRoute::ChatCompletions => "/chat/completions",
        }
    }

    fn forbidden_message(&self) -> &'static str {
        match self {
            UpstreamRoute::Models => {
                "Failed to list models: 403 Forbidden (policy/entitlement). Check Copilot settings/policies for this user."
            }
            UpstreamRoute::ChatCompletions => {
                "403 Forbidden (policy/entitlement). Copilot CLI/Chat may be disabled for this user by policy or feature toggle."
            }
        }
    }

    fn hint(&self) -> &'static str {
        match self {
            UpstreamRoute::Models => {
                "403 is commonly caused by Copilot CLI being disabled for the user (even if org is enabled). See https://github.com/settings/copilot/features (or enterprise policy settings)."
            }
            UpstreamRoute::ChatCompletions => {
                "If this works only for Enterprise Managed Users, prefer logged-in mode (ALLOW_LOGGED_IN_USER=1) and authenticate Copilot CLI on the host. Also verify Copilot settings/policies for CLI/Chat."
            }
        }
    }
}

/// Upstream 403 wins; credential-looking messages are 401 on chat only; everything else is 500.
pub fn classify_failure(route: UpstreamRoute, err: &NormalizedError) -> ErrorCode {
    if err.status == Some(403) {
        return ErrorCode::Forbidden;
    }
    if route == UpstreamRoute::ChatCompletions
        && AUTH_FAILURE.is_match(err.message.as_deref().unwrap_or(""))
    {
        return ErrorCode::InvalidApiKey;
    }
    ErrorCode::ServerError
}

pub fn failure_message(route: UpstreamRoute, code: ErrorCode, err: &NormalizedError) -> String {
    if code == ErrorCode::Forbidden {
        route.forbidden_message().to_string()
    } else {
        err.message_or_unknown().to_string()
    }
}

/// Normalizes, logs once, and turns an SDK failure into the single client-visible error.
pub async fn upstream_failure(
    state: &AppState,
    req_id: &RequestId,
    route: UpstreamRoute,
    mode: &CredentialMode,
    err: &SdkError,
) -> OpenAiError {
    let ser = normalize(&err.to_value());
    let cli_log_tail = tail_latest_log(&state.config.copilot_log_dir, LOG_TAIL_MAX_BYTES).await;

    error!(
        reqId = %req_id,
        route = route.path(),
        mode = mode.as_str(),
        error = %ser.to_value(),
        cliLogTail = cli_log_tail.as_deref().unwrap_or(""),
        "Upstream Copilot call failed"
    );

    let code = classify_failure(route, &ser);
    let message = failure_message(route, code, &ser);
    OpenAiError::new(code, message).with_debug(
        state.config.debug_errors,
        ErrorDebug {
            req_id: req_id.to_string(),
            mode: mode.as_str(),
            error: ser,
            copilot_cli_log_tail: cli_log_tail,
            hint: route.hint(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ser(value: serde_json::Value) -> NormalizedError {
        normalize(&value)
    }

    #[test]
    fn test_codes_map_to_fixed_statuses() {
        assert_eq!(ErrorCode::InvalidRequest.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::UnsupportedParameter.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::MissingApiKey.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ErrorCode::InvalidApiKey.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ErrorCode::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(ErrorCode::ServerError.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_chat_policy() {
        let chat = UpstreamRoute::ChatCompletions;
        assert_eq!(classify_failure(chat, &ser(json!({"status": 403, "message": "x"}))), ErrorCode::Forbidden);
        assert_eq!(classify_failure(chat, &ser(json!({"message": "Bad credentials"}))), ErrorCode::InvalidApiKey);
        assert_eq!(classify_failure(chat, &ser(json!({"message": "request FORBIDDEN"}))), ErrorCode::InvalidApiKey);
        assert_eq!(classify_failure(chat, &ser(json!({"message": "Invalid token supplied"}))), ErrorCode::InvalidApiKey);
        assert_eq!(classify_failure(chat, &ser(json!({"status": 502, "message": "bad gateway"}))), ErrorCode::ServerError);
        assert_eq!(classify_failure(chat, &ser(json!(null))), ErrorCode::ServerError);
    }

    #[test]
    fn test_models_policy_ignores_message_pattern() {
        let models = UpstreamRoute::Models;
        assert_eq!(classify_failure(models, &ser(json!({"statusCode": 403}))), ErrorCode::Forbidden);
        assert_eq!(classify_failure(models, &ser(json!({"message": "Unauthorized"}))), ErrorCode::ServerError);
    }

    #[test]
    fn test_failure_messages() {
        let err = ser(json!({"status": 403, "message": "raw"}));
        assert!(failure_message(UpstreamRoute::Models, ErrorCode::Forbidden, &err)
            .starts_with("Failed to list models: 403 Forbidden"));
        assert!(failure_message(UpstreamRoute::ChatCompletions, ErrorCode::Forbidden, &err)
            .starts_with("403 Forbidden (policy/entitlement)"));

        let err = ser(json!({"message": "boom"}));
        assert_eq!(failure_message(UpstreamRoute::ChatCompletions, ErrorCode::ServerError, &err), "boom");
        assert_eq!(
            failure_message(UpstreamRoute::ChatCompletions, ErrorCode::ServerError, &ser(json!({}))),
            "Unknown error"
        );
    }

    #[test]
    fn test_error_body_shape() {
        let err = OpenAiError::new(ErrorCode::UnsupportedParameter, "nope").with_param("stream");
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(
            serde_json::to_value(&err.body).unwrap(),
            json!({"error": {"message": "nope", "type": "invalid_request_error", "code": "unsupported_parameter", "param": "stream"}})
        );
    }

    #[test]
    fn test_debug_only_when_enabled() {
        let debug = || ErrorDebug {
            req_id: "r1".into(),
            mode: "bearer-token",
            error: NormalizedError::default(),
            copilot_cli_log_tail: None,
            hint: "h",
        };
        let hidden = OpenAiError::new(ErrorCode::ServerError, "x").with_debug(false, debug());
        assert!(serde_json::to_value(&hidden.body).unwrap().get("debug").is_none());

        let shown = OpenAiError::new(ErrorCode::ServerError, "x").with_debug(true, debug());
        let value = serde_json::to_value(&shown.body).unwrap();
        assert_eq!(value["debug"]["reqId"], json!("r1"));
        assert_eq!(value["debug"]["copilotCliLogTail"], serde_json::Value::Null);
        assert_eq!(value["debug"]["hint"], json!("h"));
    }
}
