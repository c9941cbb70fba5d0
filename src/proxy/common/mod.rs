// Common module - shared request-independent helpers

pub mod auth;
pub mod error_normalize;
pub mod log_tail;
pub mod redact;

pub use auth::{bearer_token, resolve_credential, CredentialMode};
pub use error_normalize::{normalize, NormalizedError};
pub use log_tail::{ensure_dir, tail_latest_log};
pub use redact::{redact, redact_str};
