// Upstream client implementation
// Talks to the GitHub Copilot HTTP API: token exchange, model listing, chat completions.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reqwest::{header, Client, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tokio::time::Duration;

use super::sdk::{ClientOptions, CopilotClient, CopilotClientFactory, CopilotSession, SdkError};
use crate::error::{AppError, AppResult};
use crate::proxy::common::CredentialMode;
use crate::proxy::config::ProxyConfig;

const EDITOR_VERSION: &str = "vscode/1.95.0";
const EDITOR_PLUGIN_VERSION: &str = "copilot-chat/0.26.7";
const INTEGRATION_ID: &str = "vscode-chat";

/// Creates one `HttpCopilotClient` per request, all sharing a pooled reqwest client.
pub struct HttpCopilotClientFactory {
    http: Client,
    api_base_url: String,
    token_url: String,
    /// Where editors persist the signed-in GitHub user (`<config>/github-copilot`).
    login_config_dir: Option<PathBuf>,
}

impl HttpCopilotClientFactory {
    pub fn new(config: &ProxyConfig) -> AppResult<Self> {
        let http = Self::build_http_client()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_base_url: config.copilot_api_base_url.clone(),
            token_url: config.copilot_token_url.clone(),
            login_config_dir: dirs::config_dir().map(|dir| dir.join("github-copilot")),
        })
    }

    pub fn with_login_config_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.login_config_dir = dir;
        self
    }

    fn build_http_client() -> Result<Client, reqwest::Error> {
        Client::builder()
            .connect_timeout(Duration::from_secs(20))
            .pool_max_idle_per_host(16)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .timeout(Duration::from_secs(600))
            .user_agent(crate::constants::USER_AGENT.as_str())
            .build()
    }
}

impl CopilotClientFactory for HttpCopilotClientFactory {
    fn create(&self, options: ClientOptions) -> Box<dyn CopilotClient> {
        Box::new(HttpCopilotClient {
            http: self.http.clone(),
            api_base_url: self.api_base_url.clone(),
            token_url: self.token_url.clone(),
            login_config_dir: self.login_config_dir.clone(),
            credential: options.credential,
            api_token: RwLock::new(None),
        })
    }
}

pub struct HttpCopilotClient {
    http: Client,
    api_base_url: String,
    token_url: String,
    login_config_dir: Option<PathBuf>,
    credential: CredentialMode,
    /// Short-lived Copilot API token, present between `start` and `stop`.
    api_token: RwLock<Option<String>>,
}

#[derive(Deserialize)]
struct CopilotTokenResponse {
    token: String,
    #[serde(default)]
    expires_at: Option<u64>,
}

impl HttpCopilotClient {
    async fn github_token(&self) -> Result<String, SdkError> {
        match &self.credential {
            CredentialMode::BearerToken(token) => Ok(token.clone()),
            CredentialMode::LoggedInUser => {
                let dir = self.login_config_dir.as_deref().ok_or_else(|| {
                    SdkError::new("AuthError", "No user config directory to read the Copilot login from")
                        .with_code("not_logged_in")
                })?;
                load_saved_github_token(dir).await.ok_or_else(|| {
                    SdkError::new(
                        "AuthError",
                        format!(
                            "No logged-in Copilot user found under {} (hosts.json / apps.json)",
                            dir.display()
                        ),
                    )
                    .with_code("not_logged_in")
                })
            }
        }
    }

    async fn api_headers(&self) -> Result<header::HeaderMap, SdkError> {
        let guard = self.api_token.read().await;
        let token = guard.as_deref().ok_or_else(SdkError::not_started)?;
        build_api_headers(token)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base_url, path)
    }
}

#[async_trait]
impl CopilotClient for HttpCopilotClient {
    async fn start(&self) -> Result<(), SdkError> {
        let github_token = self.github_token().await?;
        tracing::debug!(
            "Exchanging GitHub token for Copilot token | mode={} | url={}",
            self.credential.as_str(),
            self.token_url
        );

        let context = "Copilot token request failed";
        let response = self
            .http
            .get(&self.token_url)
            .header(header::ACCEPT, "application/json")
            .header(header::AUTHORIZATION, format!("token {}", github_token))
            .header("editor-version", EDITOR_VERSION)
            .header("editor-plugin-version", EDITOR_PLUGIN_VERSION)
            .send()
            .await
            .map_err(|e| SdkError::transport(context, &e))?;
        let response = ensure_success(context, response).await?;

        let parsed: CopilotTokenResponse = response
            .json()
            .await
            .map_err(|e| SdkError::decode("Failed to parse Copilot token response", e))?;
        tracing::info!(
            "Copilot client started | mode={} | token_expires_at={:?}",
            self.credential.as_str(),
            parsed.expires_at
        );

        *self.api_token.write().await = Some(parsed.token);
        Ok(())
    }

    async fn stop(&self) -> Result<(), SdkError> {
        let had_token = self.api_token.write().await.take().is_some();
        tracing::debug!("Copilot client stopped | was_started={}", had_token);
        Ok(())
    }

    async fn list_models(&self) -> Result<Vec<Value>, SdkError> {
        let headers = self.api_headers().await?;
        let context = "Listing models failed";
        let response = self
            .http
            .get(self.url("/models"))
            .headers(headers)
            .send()
            .await
            .map_err(|e| SdkError::transport(context, &e))?;
        let response = ensure_success(context, response).await?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| SdkError::decode("Failed to parse model list", e))?;
        let models = match body {
            Value::Array(items) => items,
            Value::Object(mut obj) => match obj.remove("data") {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            },
            _ => Vec::new(),
        };
        tracing::debug!("Listed {} models", models.len());
        Ok(models)
    }

    async fn create_session(&self, model: &str) -> Result<Box<dyn CopilotSession>, SdkError> {
        let headers = self.api_headers().await?;
        let session = HttpCopilotSession {
            id: uuid::Uuid::new_v4().to_string(),
            http: self.http.clone(),
            url: self.url("/chat/completions"),
            headers,
            model: model.to_string(),
        };
        tracing::debug!("Session created | id={} | model={}", session.id, session.model);
        Ok(Box::new(session))
    }
}

pub struct HttpCopilotSession {
    id: String,
    http: Client,
    url: String,
    headers: header::HeaderMap,
    model: String,
}

#[async_trait]
impl CopilotSession for HttpCopilotSession {
    fn id(&self) -> &str {
        &self.id
    }

    async fn send_and_wait(&self, prompt: &str) -> Result<Value, SdkError> {
        let body = json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
            "stream": false,
        });

        let context = "Chat completion failed";
        let response = self
            .http
            .post(&self.url)
            .headers(self.headers.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| SdkError::transport(context, &e))?;
        let response = ensure_success(context, response).await?;

        let completion: Value = response
            .json()
            .await
            .map_err(|e| SdkError::decode("Failed to parse chat completion", e))?;
        tracing::debug!(
            "Session reply received | id={} | model={} | finish_reason={:?}",
            self.id,
            self.model,
            completion.pointer("/choices/0/finish_reason")
        );

        Ok(assistant_event(&completion))
    }

    async fn destroy(&self) -> Result<(), SdkError> {
        tracing::debug!("Session destroyed | id={}", self.id);
        Ok(())
    }
}

/// Wraps a chat completion as the `assistant.message` event handlers read `data.content` from.
fn assistant_event(completion: &Value) -> Value {
    let content = completion
        .pointer("/choices/0/message/content")
        .cloned()
        .unwrap_or(Value::Null);
    json!({
        "type": "assistant.message",
        "data": {
            "messageId": completion.get("id").cloned().unwrap_or(Value::Null),
            "content": content,
        }
    })
}

fn build_api_headers(token: &str) -> Result<header::HeaderMap, SdkError> {
    let mut headers = header::HeaderMap::new();
    headers.insert(
        header::AUTHORIZATION,
        header::HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| SdkError::new("AuthError", "Copilot token is not a valid header value"))?,
    );
    headers.insert(header::CONTENT_TYPE, header::HeaderValue::from_static("application/json"));
    headers.insert("editor-version", header::HeaderValue::from_static(EDITOR_VERSION));
    headers.insert(
        "editor-plugin-version",
        header::HeaderValue::from_static(EDITOR_PLUGIN_VERSION),
    );
    headers.insert("copilot-integration-id", header::HeaderValue::from_static(INTEGRATION_ID));
    headers.insert("openai-intent", header::HeaderValue::from_static("conversation-panel"));
    Ok(headers)
}

/// Turns a non-2xx response into an `SdkError` carrying status, headers and body.
async fn ensure_success(context: &str, response: Response) -> Result<Response, SdkError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let headers: BTreeMap<String, String> = response
        .headers()
        .iter()
        .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
        .collect();
    let body = response.text().await.unwrap_or_default();
    tracing::warn!("{} | status={}", context, status);

    Err(SdkError::http(
        context,
        status.as_u16(),
        status.canonical_reason().unwrap_or(""),
        headers,
        &body,
    ))
}

#[derive(Deserialize)]
struct SavedLogin {
    oauth_token: Option<String>,
}

/// Reads the GitHub OAuth token that Copilot editors save after sign-in.
/// `hosts.json` keys by host, `apps.json` by `host:client_id`.
pub async fn load_saved_github_token(dir: &Path) -> Option<String> {
    for file in ["hosts.json", "apps.json"] {
        let Ok(contents) = tokio::fs::read_to_string(dir.join(file)).await else {
            continue;
        };
        let Ok(entries) = serde_json::from_str::<BTreeMap<String, SavedLogin>>(&contents) else {
            tracing::debug!("Ignoring unreadable {}", file);
            continue;
        };
        let token = entries
            .into_iter()
            .filter(|(host, _)| host == "github.com" || host.starts_with("github.com:"))
            .find_map(|(_, login)| login.oauth_token.filter(|t| !t.trim().is_empty()));
        if token.is_some() {
            return token;
        }
    }
    None
}
