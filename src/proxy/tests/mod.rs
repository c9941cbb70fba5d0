//! Router-level scenario tests against a scripted Copilot client.

mod models;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{HeaderMap, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};
use tower::ServiceExt;

use crate::proxy::common::CredentialMode;
use crate::proxy::config::ProxyConfig;
use crate::proxy::server::{build_router, AppState};
use crate::proxy::upstream::{
    ClientOptions, CopilotClient, CopilotClientFactory, CopilotSession, SdkError,
};

/// What the scripted client answers at each step.
#[derive(Clone)]
pub struct Script {
    pub start: Result<(), SdkError>,
    pub models: Result<Vec<Value>, SdkError>,
    pub reply: Result<Value, SdkError>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            start: Ok(()),
            models: Ok(vec![json!({"id": "gpt-4.1"}), json!({"name": "claude-sonnet-4"})]),
            reply: Ok(json!({"type": "assistant.message", "data": {"content": "Hello from Copilot"}})),
        }
    }
}

/// Everything the handlers did to the client, for assertions.
#[derive(Default)]
pub struct Recorder {
    pub credentials: Mutex<Vec<CredentialMode>>,
    pub sessions: Mutex<Vec<String>>,
    pub prompts: Mutex<Vec<String>>,
    pub stops: AtomicUsize,
    pub destroys: AtomicUsize,
}

impl Recorder {
    pub fn credentials(&self) -> Vec<CredentialMode> {
        self.credentials.lock().unwrap().clone()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn sessions(&self) -> Vec<String> {
        self.sessions.lock().unwrap().clone()
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn destroys(&self) -> usize {
        self.destroys.load(Ordering::SeqCst)
    }
}

pub struct ScriptedFactory {
    script: Script,
    recorder: Arc<Recorder>,
}

impl CopilotClientFactory for ScriptedFactory {
    fn create(&self, options: ClientOptions) -> Box<dyn CopilotClient> {
        self.recorder.credentials.lock().unwrap().push(options.credential);
        Box::new(ScriptedClient {
            script: self.script.clone(),
            recorder: self.recorder.clone(),
        })
    }
}

struct ScriptedClient {
    script: Script,
    recorder: Arc<Recorder>,
}

#[async_trait]
impl CopilotClient for ScriptedClient {
    async fn start(&self) -> Result<(), SdkError> {
        self.script.start.clone()
    }

    async fn stop(&self) -> Result<(), SdkError> {
        self.recorder.stops.fetch_add(1, Ordering::SeqCst);
        // Cleanup failures must never reach the client
        Err(SdkError::new("StopError", "already stopped"))
    }

    async fn list_models(&self) -> Result<Vec<Value>, SdkError> {
        self.script.models.clone()
    }

    async fn create_session(&self, model: &str) -> Result<Box<dyn CopilotSession>, SdkError> {
        self.recorder.sessions.lock().unwrap().push(model.to_string());
        Ok(Box::new(ScriptedSession {
            reply: self.script.reply.clone(),
            recorder: self.recorder.clone(),
        }))
    }
}

struct ScriptedSession {
    reply: Result<Value, SdkError>,
    recorder: Arc<Recorder>,
}

#[async_trait]
impl CopilotSession for ScriptedSession {
    fn id(&self) -> &str {
        "session-test"
    }

    async fn send_and_wait(&self, prompt: &str) -> Result<Value, SdkError> {
        self.recorder.prompts.lock().unwrap().push(prompt.to_string());
        self.reply.clone()
    }

    async fn destroy(&self) -> Result<(), SdkError> {
        self.recorder.destroys.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub recorder: Arc<Recorder>,
    pub log_dir: PathBuf,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.log_dir);
    }
}

pub fn test_config() -> ProxyConfig {
    ProxyConfig {
        copilot_log_dir: std::env::temp_dir()
            .join(format!("copilot-gateway-test-{}", uuid::Uuid::new_v4())),
        ..ProxyConfig::default()
    }
}

pub fn app_with(config: ProxyConfig, script: Script) -> TestApp {
    let recorder = Arc::new(Recorder::default());
    let log_dir = config.copilot_log_dir.clone();
    let factory = ScriptedFactory {
        script,
        recorder: recorder.clone(),
    };
    TestApp {
        router: build_router(AppState::new(config, Arc::new(factory))),
        recorder,
        log_dir,
    }
}

pub fn app(script: Script) -> TestApp {
    app_with(test_config(), script)
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// Sends one request; non-JSON bodies come back as a JSON string.
pub async fn send(router: &Router, request: Request<Body>) -> TestResponse {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    TestResponse {
        status,
        headers,
        body,
    }
}

pub fn chat_request(token: Option<&str>, body: impl Into<Body>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/chat/completions")
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(body.into()).unwrap()
}

pub fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn forbidden() -> SdkError {
    SdkError::http(
        "Chat request failed",
        403,
        "Forbidden",
        Default::default(),
        r#"{"message":"Copilot is disabled by policy"}"#,
    )
}

pub fn bad_credentials() -> SdkError {
    SdkError::http(
        "Copilot token request failed",
        401,
        "Unauthorized",
        Default::default(),
        r#"{"message":"Bad credentials"}"#,
    )
}
