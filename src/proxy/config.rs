// Gateway configuration
// Built once at startup from the environment and shared read-only with every handler.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use crate::error::{AppError, AppResult};

pub const DEFAULT_PORT: u16 = 8788;
pub const DEFAULT_COPILOT_API_BASE_URL: &str = "https://api.githubcopilot.com";
pub const DEFAULT_COPILOT_TOKEN_URL: &str = "https://api.github.com/copilot_internal/v2/token";
pub const DEFAULT_COPILOT_LOG_LEVEL: &str = "debug";
const DEFAULT_LOG_DIR_NAME: &str = ".copilot-logs";

#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub host: IpAddr,
    pub port: u16,
    /// Attach `debug` payloads to error bodies and expose `/debug/copilot/logs`.
    pub debug_errors: bool,
    /// Requests without a bearer token fall back to the server-side Copilot login.
    pub allow_logged_in_user: bool,
    /// Verbosity of the upstream client's own log files.
    pub copilot_log_level: String,
    /// Where the upstream client writes its log files (and where the tailer reads them).
    pub copilot_log_dir: PathBuf,
    pub copilot_api_base_url: String,
    pub copilot_token_url: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            debug_errors: false,
            allow_logged_in_user: false,
            copilot_log_level: DEFAULT_COPILOT_LOG_LEVEL.to_string(),
            copilot_log_dir: default_log_dir(),
            copilot_api_base_url: DEFAULT_COPILOT_API_BASE_URL.to_string(),
            copilot_token_url: DEFAULT_COPILOT_TOKEN_URL.to_string(),
        }
    }
}

impl ProxyConfig {
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup("PORT") {
            config.port = raw
                .trim()
                .parse()
                .map_err(|_| AppError::Config(format!("PORT is not a valid port: {:?}", raw)))?;
        }
        if let Some(raw) = lookup("HOST") {
            config.host = raw
                .trim()
                .parse()
                .map_err(|_| AppError::Config(format!("HOST is not a valid IP address: {:?}", raw)))?;
        }

        // Flags are on only for the literal "1"
        config.debug_errors = lookup("DEBUG_ERRORS").as_deref() == Some("1");
        config.allow_logged_in_user = lookup("ALLOW_LOGGED_IN_USER").as_deref() == Some("1");

        if let Some(level) = lookup("COPILOT_LOG_LEVEL") {
            config.copilot_log_level = level;
        }
        if let Some(dir) = lookup("COPILOT_LOG_DIR") {
            config.copilot_log_dir = absolutize(PathBuf::from(dir));
        }
        if let Some(url) = non_blank(lookup("COPILOT_API_BASE_URL")) {
            config.copilot_api_base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(url) = non_blank(lookup("COPILOT_TOKEN_URL")) {
            config.copilot_token_url = url;
        }

        Ok(config)
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn default_log_dir() -> PathBuf {
    absolutize(PathBuf::from(DEFAULT_LOG_DIR_NAME))
}

fn absolutize(path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        return path;
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path,
    }
}
