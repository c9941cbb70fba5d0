use axum::http::StatusCode;
use serde_json::json;

use super::*;

#[tokio::test]
async fn test_models_without_token_is_401() {
    let app = app(Script::default());
    let resp = send(&app.router, get_request("/models", None)).await;

    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.body["error"]["code"], json!("missing_api_key"));
}

#[tokio::test]
async fn test_models_fallback_uses_logged_in_user() {
    let config = ProxyConfig {
        allow_logged_in_user: true,
        ..test_config()
    };
    let app = app_with(config, Script::default());
    let resp = send(&app.router, get_request("/models", None)).await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(app.recorder.credentials(), vec![CredentialMode::LoggedInUser]);
    assert_eq!(app.recorder.stops(), 1);
}

#[tokio::test]
async fn test_models_are_mapped() {
    let app = app(Script {
        models: Ok(vec![json!({"id": "gpt-4.1"}), json!({"model": "o3-mini"}), json!("gemini-2.5-pro")]),
        ..Script::default()
    });
    let resp = send(&app.router, get_request("/v1/models", Some("tok"))).await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(
        resp.body,
        json!({
            "object": "list",
            "data": [
                {"id": "gpt-4.1", "object": "model", "owned_by": "github-copilot"},
                {"id": "o3-mini", "object": "model", "owned_by": "github-copilot"},
                {"id": "gemini-2.5-pro", "object": "model", "owned_by": "github-copilot"}
            ]
        })
    );
}

#[tokio::test]
async fn test_models_403_is_forbidden() {
    let app = app(Script {
        models: Err(forbidden()),
        ..Script::default()
    });
    let resp = send(&app.router, get_request("/models", Some("tok"))).await;

    assert_eq!(resp.status, StatusCode::FORBIDDEN);
    assert_eq!(resp.body["error"]["code"], json!("forbidden"));
    assert!(resp.body["error"]["message"]
        .as_str()
        .unwrap()
        .starts_with("Failed to list models: 403 Forbidden"));
    assert_eq!(app.recorder.stops(), 1);
}

#[tokio::test]
async fn test_models_credential_failure_is_server_error() {
    let config = ProxyConfig {
        debug_errors: true,
        ..test_config()
    };
    let app = app_with(config, Script {
        start: Err(bad_credentials()),
        ..Script::default()
    });
    let resp = send(&app.router, get_request("/models", Some("tok"))).await;

    assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(resp.body["error"]["code"], json!("server_error"));
    assert_eq!(resp.body["debug"]["error"]["status"], json!(401));
    assert!(resp.body["debug"]["hint"]
        .as_str()
        .unwrap()
        .contains("github.com/settings/copilot/features"));
    // Empty log directory: no tail
    assert_eq!(resp.body["debug"]["copilotCliLogTail"], serde_json::Value::Null);
}
