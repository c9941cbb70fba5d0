use once_cell::sync::Lazy;

/// Model used when the request names none (or a blank one).
pub const DEFAULT_MODEL: &str = "gpt-4.1";

/// `owned_by` reported for every model in `/models`.
pub const MODEL_OWNER: &str = "github-copilot";

/// Header used to correlate a request across logs and responses.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Inbound JSON bodies are capped at 1 MiB.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Default size of the diagnostic log tail.
pub const LOG_TAIL_MAX_BYTES: usize = 20_000;

pub static USER_AGENT: Lazy<String> =
    Lazy::new(|| format!("copilot-gateway/{}", env!("CARGO_PKG_VERSION")));
