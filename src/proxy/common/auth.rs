// Credential extraction
use axum::http::{header, HeaderMap};
use once_cell::sync::Lazy;
use regex::Regex;

static BEARER_SCHEME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^Bearer\s+(.+)$").expect("valid regex"));

/// How the upstream client authenticates for this request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialMode {
    /// GitHub token passed through from `Authorization: Bearer <token>`.
    BearerToken(String),
    /// Server-side Copilot login, only when the operator allows it.
    LoggedInUser,
}

impl CredentialMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialMode::BearerToken(_) => "bearer-token",
            CredentialMode::LoggedInUser => "logged-in-user",
        }
    }
}

/// Extracts the bearer token, trimmed. Missing header, other schemes and blank tokens give `None`.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let captures = BEARER_SCHEME.captures(raw)?;
    let token = captures.get(1)?.as_str().trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Picks the credential mode; `None` means the request must be rejected.
pub fn resolve_credential(token: Option<String>, allow_logged_in_user: bool) -> Option<CredentialMode> {
    match token {
        Some(token) => Some(CredentialMode::BearerToken(token)),
        None if allow_logged_in_user => Some(CredentialMode::LoggedInUser),
        None => None,
    }
}
