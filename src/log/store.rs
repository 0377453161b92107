use super::event_log::EventLog;
use super::persist::JsonLogSink;
use crate::error::SessionError;
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::warn;

/// Creates session logs, one open session at a time
pub struct EventLogStore {
    /// Directory for the persisted log; `None` keeps sessions in memory only
    log_dir: Option<PathBuf>,

    /// Most recently created session, open or closed
    current: Mutex<Option<EventLog>>,
}

impl EventLogStore {
    pub fn new(log_dir: Option<PathBuf>) -> Self {
        Self {
            log_dir,
            current: Mutex::new(None),
        }
    }

    /// Store that never touches the filesystem
    pub fn in_memory() -> Self {
        Self::new(None)
    }

    /// Open a new session log
    ///
    /// Fails with `AlreadyActive` while the previous session has not been finalized.
    pub async fn create(&self, candidate_id: &str) -> Result<EventLog, SessionError> {
        let mut current = self.current.lock().await;

        if let Some(log) = current.as_ref() {
            if !log.is_closed().await {
                warn!("Refusing new session: {} is still active", log.session_id());
                return Err(SessionError::AlreadyActive {
                    session_id: log.session_id().to_string(),
                });
            }
        }

        let sink = self.log_dir.as_ref().map(JsonLogSink::in_dir);
        let log = EventLog::open(candidate_id, sink).await?;
        *current = Some(log.clone());

        Ok(log)
    }

    /// The latest session log, if any was created
    pub async fn current(&self) -> Option<EventLog> {
        self.current.lock().await.clone()
    }
}
