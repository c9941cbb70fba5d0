// Diagnostic log tailing
// Best effort only: every failure collapses to `None` and never reaches the request path.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tokio::fs;

use super::redact::redact_str;

pub async fn ensure_dir(dir: &Path) {
    if let Err(e) = fs::create_dir_all(dir).await {
        tracing::debug!("Could not create log dir {}: {}", dir.display(), e);
    }
}

/// Returns the redacted tail (last `max_bytes` bytes) of the most recently modified file in `dir`.
pub async fn tail_latest_log(dir: &Path, max_bytes: usize) -> Option<String> {
    ensure_dir(dir).await;

    let newest = newest_file(dir).await?;
    let buf = fs::read(&newest).await.ok()?;
    let start = buf.len().saturating_sub(max_bytes);
    // Byte slicing may split a multi-byte sequence; lossy decoding keeps the rest readable
    let text = String::from_utf8_lossy(&buf[start..]);
    Some(redact_str(&text))
}

async fn newest_file(dir: &Path) -> Option<PathBuf> {
    let mut entries = fs::read_dir(dir).await.ok()?;
    let mut newest: Option<(SystemTime, PathBuf)> = None;

    while let Some(entry) = entries.next_entry().await.ok()? {
        let path = entry.path();
        // Follows symlinks, like stat(2)
        let meta = fs::metadata(&path).await.ok()?;
        if !meta.is_file() {
            continue;
        }
        let modified = meta.modified().ok()?;
        match &newest {
            Some((best, _)) if *best >= modified => {}
            _ => newest = Some((modified, path)),
        }
    }

    newest.map(|(_, path)| path)
}
