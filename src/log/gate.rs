use super::event_log::EventLog;
use super::model::EventPayload;
use crate::error::SessionError;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// An event waiting to be appended
#[derive(Debug, Clone)]
pub struct Submission {
    /// Producer name, for log lines
    pub source: &'static str,

    /// Caller-supplied timestamp; `None` lets the log stamp it
    pub ts: Option<f64>,

    pub payload: EventPayload,
}

/// Producer side of the writer gate
#[derive(Clone)]
pub struct GateSender {
    tx: mpsc::Sender<Submission>,
    source: &'static str,
    session_id: String,
}

impl GateSender {
    /// Same gate, different producer name
    pub fn for_source(&self, source: &'static str) -> Self {
        Self {
            tx: self.tx.clone(),
            source,
            session_id: self.session_id.clone(),
        }
    }

    /// Queue an event; waits while the gate is full
    pub async fn submit(&self, payload: EventPayload) -> Result<(), SessionError> {
        self.send(None, payload).await
    }

    pub async fn submit_at(&self, ts: f64, payload: EventPayload) -> Result<(), SessionError> {
        self.send(Some(ts), payload).await
    }

    async fn send(&self, ts: Option<f64>, payload: EventPayload) -> Result<(), SessionError> {
        let submission = Submission {
            source: self.source,
            ts,
            payload,
        };
        self.tx.send(submission).await.map_err(|e| {
            warn!("Writer gate closed, dropping {} event from {}", e.0.payload.kind(), self.source);
            SessionError::SessionClosed {
                session_id: self.session_id.clone(),
            }
        })
    }
}

/// Outcome counters of a gate task
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GateStats {
    pub appended: usize,
    pub rejected: usize,
}

/// Single consumer that serializes producer submissions into the event log
pub struct WriterGate;

impl WriterGate {
    /// Spawn the gate task
    ///
    /// The task runs until every `GateSender` is dropped, draining whatever was queued.
    /// A persistence failure cancels `fatal` so the session winds down.
    pub fn spawn(
        log: EventLog,
        capacity: usize,
        fatal: CancellationToken,
    ) -> (GateSender, JoinHandle<GateStats>) {
        let (tx, mut rx) = mpsc::channel::<Submission>(capacity.max(1));
        let session_id = log.session_id().to_string();

        let handle = tokio::spawn(async move {
            info!("Writer gate started for session {}", log.session_id());
            let mut stats = GateStats::default();

            while let Some(submission) = rx.recv().await {
                let kind = submission.payload.kind();
                let result = match submission.ts {
                    Some(ts) => log.append_at(ts, submission.payload).await,
                    None => log.append(submission.payload).await,
                };

                match result {
                    Ok(event) => {
                        stats.appended += 1;
                        debug!("{} appended {} at {:.2}s", submission.source, kind, event.ts);
                    }
                    Err(SessionError::Persistence(e)) => {
                        stats.rejected += 1;
                        error!("Session log write failed, stopping session: {}", e);
                        fatal.cancel();
                    }
                    Err(e) => {
                        stats.rejected += 1;
                        warn!("{} event from {} rejected: {}", kind, submission.source, e);
                    }
                }
            }

            info!(
                "Writer gate stopped ({} appended, {} rejected)",
                stats.appended, stats.rejected
            );
            stats
        });

        (
            GateSender {
                tx,
                source: "gate",
                session_id,
            },
            handle,
        )
    }
}
