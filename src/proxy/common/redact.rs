// Secret masking for logs and debug payloads

use once_cell::sync::Lazy;
use regex::Regex;

const REDACTED: &str = "[REDACTED]";

// Token characters: letters, digits, `_`, `-`, `.`, `=`
// Word boundaries are ASCII-only so tokens glued to non-ASCII text still match
static AUTH_HEADER_BEARER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)Authorization:\s*Bearer\s+[A-Za-z0-9_\-.=]+").expect("valid regex")
});
static BEARER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Bearer\s+[A-Za-z0-9_\-.=]+").expect("valid regex"));
static GITHUB_PREFIXED_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?-u:\b)(ghp|gho|ghu|ghs|ghr)_[A-Za-z0-9]{10,}(?-u:\b)").expect("valid regex"));
static GITHUB_PAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?-u:\b)github_pat_[A-Za-z0-9_]{10,}(?-u:\b)").expect("valid regex"));

/// Masks suspected credentials. `None` passes through untouched.
pub fn redact(text: Option<&str>) -> Option<String> {
    text.map(redact_str)
}

/// Applies every substitution in order. Running it twice changes nothing.
pub fn redact_str(text: &str) -> String {
    let out = AUTH_HEADER_BEARER.replace_all(text, format!("Authorization: Bearer {}", REDACTED));
    let out = BEARER.replace_all(&out, format!("Bearer {}", REDACTED));
    let out = GITHUB_PREFIXED_TOKEN.replace_all(&out, format!("${{1}}_{}", REDACTED));
    let out = GITHUB_PAT.replace_all(&out, format!("github_pat_{}", REDACTED));
    out.into_owned()
}
