use super::model::Session;
use crate::error::SessionError;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Log file name inside the configured log directory
pub const SESSION_LOG_FILE: &str = "session_log.json";

/// Writes the whole session document after every mutation
///
/// The file is replaced through a temporary sibling and a rename, so a dashboard
/// polling the file never reads half a document.
#[derive(Debug, Clone)]
pub struct JsonLogSink {
    path: PathBuf,
}

impl JsonLogSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Sink writing `session_log.json` into `dir`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(SESSION_LOG_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn write(&self, session: &Session) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    SessionError::Persistence(format!("failed to create log dir: {}", e))
                })?;
            }
        }

        let content = serde_json::to_vec_pretty(session).map_err(|e| {
            SessionError::Persistence(format!("failed to serialize session: {}", e))
        })?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content).await.map_err(|e| {
            SessionError::Persistence(format!("failed to write {}: {}", tmp.display(), e))
        })?;
        fs::rename(&tmp, &self.path).await.map_err(|e| {
            SessionError::Persistence(format!("failed to replace {}: {}", self.path.display(), e))
        })?;

        debug!(
            "Persisted session {} ({} events) to {}",
            session.session_id,
            session.events.len(),
            self.path.display()
        );

        Ok(())
    }
}

/// Read a persisted session log
pub async fn read_session(path: impl AsRef<Path>) -> Result<Session> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read session log {}", path.display()))?;

    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse session log {}", path.display()))
}
