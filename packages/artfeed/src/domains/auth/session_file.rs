//! Session persistence for the command line.
//!
//! The file holds the access and refresh tokens as JSON, so a later run can
//! restore the session or refresh it once the access token has expired.

use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context, Result};
use supabase_client::Session;
use tracing::warn;

use super::StoredSession;

/// Stored tokens, or `None` when there is no usable file.
pub async fn load(path: &Path) -> Result<Option<StoredSession>> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("Failed to read {}", path.display())),
    };

    match serde_json::from_str::<StoredSession>(&raw) {
        Ok(stored) => Ok(Some(stored)),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Ignoring unreadable session file");
            Ok(None)
        }
    }
}

pub async fn save(path: &Path, session: &Session) -> Result<()> {
    let body = serde_json::to_vec_pretty(&StoredSession::from(session))?;
    tokio::fs::write(path, body)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

pub async fn forget(path: &Path) -> Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
    }
}
