use super::config::SessionConfig;
use super::stats::{SessionReport, SessionStats};
use crate::activity::ActivityMonitor;
use crate::clarity::{ClarityEvaluator, ClarityPipeline, TranscriptBuffer};
use crate::error::{EvaluationError, SessionError};
use crate::log::{
    EventLog, EventLogStore, EventPayload, FinalAnalysis, GateStats, Session, Summary, Verdict,
    WriterGate,
};
use crate::scoring::reduce_session;
use std::sync::{Arc, Weak};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Caller's view of a running session
#[derive(Clone)]
pub struct SessionHandle {
    log: EventLog,
    cancel: CancellationToken,
}

impl SessionHandle {
    pub fn session_id(&self) -> &str {
        self.log.session_id()
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    pub async fn snapshot(&self) -> Session {
        self.log.snapshot().await
    }

    /// Signal the session to stop; finalization runs in the background
    pub fn request_stop(&self) {
        self.cancel.cancel();
    }

    /// Token cancelled when the session starts stopping
    pub fn stop_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

/// Everything a running session owns besides its log
struct ActiveSession {
    log: EventLog,
    cancel: CancellationToken,
    titles: mpsc::Sender<String>,
    chunks: mpsc::Sender<String>,
    transcript: TranscriptBuffer,
    producers: Vec<JoinHandle<usize>>,
    gate: JoinHandle<GateStats>,
}

/// Session lifecycle controller
///
/// Drives a session from OPEN to CLOSED exactly once:
/// - `start` opens the log and spawns the activity and clarity producers
/// - `stop` (or the session's stop token) cancels producers, waits for them up to the
///   stop timeout, seals intake, runs the final clarity analysis, reduces and finalizes
pub struct SessionManager {
    config: SessionConfig,
    store: EventLogStore,
    evaluator: Arc<dyn ClarityEvaluator>,
    active: Mutex<Option<ActiveSession>>,
    /// Stop watchers; one may be finalizing a session in the background
    watchers: Mutex<Vec<JoinHandle<()>>>,
}

impl SessionManager {
    pub fn new(config: SessionConfig, evaluator: Arc<dyn ClarityEvaluator>) -> Self {
        let store = EventLogStore::new(config.log_dir.clone());
        Self {
            config,
            store,
            evaluator,
            active: Mutex::new(None),
            watchers: Mutex::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Open a session for `candidate_id` and start its producers
    pub async fn start(self: &Arc<Self>, candidate_id: &str) -> Result<SessionHandle, SessionError> {
        let mut active = self.active.lock().await;
        let log = self.store.create(candidate_id).await?;

        let cancel = CancellationToken::new();
        let capacity = self.config.channel_capacity;

        let (gate, gate_task) = WriterGate::spawn(log.clone(), capacity, cancel.clone());
        let (titles_tx, titles_rx) = mpsc::channel(capacity.max(1));
        let (chunks_tx, chunks_rx) = mpsc::channel(capacity.max(1));
        let transcript = TranscriptBuffer::new();

        let monitor = ActivityMonitor::new(gate.for_source("activity"));
        let pipeline = ClarityPipeline::new(
            Arc::clone(&self.evaluator),
            gate.for_source("clarity"),
            transcript.clone(),
            self.config.min_words,
        );
        // The gate task ends once the producers drop their senders.
        drop(gate);

        let producers = vec![
            tokio::spawn(monitor.run(titles_rx, cancel.clone())),
            tokio::spawn(pipeline.run(chunks_rx, cancel.clone())),
        ];

        let watcher = self.spawn_stop_watcher(log.session_id().to_string(), cancel.clone());
        {
            let mut watchers = self.watchers.lock().await;
            watchers.retain(|w| !w.is_finished());
            watchers.push(watcher);
        }

        *active = Some(ActiveSession {
            log: log.clone(),
            cancel: cancel.clone(),
            titles: titles_tx,
            chunks: chunks_tx,
            transcript,
            producers,
            gate: gate_task,
        });

        info!("Session {} is live for {}", log.session_id(), candidate_id);

        Ok(SessionHandle { log, cancel })
    }

    /// Finalize the session once its stop token fires, whoever cancelled it
    fn spawn_stop_watcher(
        self: &Arc<Self>,
        session_id: String,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let manager: Weak<Self> = Arc::downgrade(self);

        tokio::spawn(async move {
            cancel.cancelled().await;

            let Some(manager) = manager.upgrade() else {
                return;
            };

            match manager.stop_session(&session_id).await {
                Ok(report) => info!(
                    "Session {} closed by stop signal: {:?}",
                    session_id, report.summary.verdict
                ),
                // Already closed through `stop`
                Err(SessionError::NoActiveSession) => {}
                Err(e) => warn!("Stop signal for session {} failed: {}", session_id, e),
            }
        })
    }

    /// Stop the running session, if any, and wait for closes already under way
    ///
    /// Returns the report when this call did the stopping. A session whose stop token
    /// already fired is finalized by its watcher; this waits for that to finish.
    pub async fn shutdown(&self) -> Option<SessionReport> {
        let report = match self.stop().await {
            Ok(report) => Some(report),
            Err(SessionError::NoActiveSession) => None,
            Err(e) => {
                warn!("Failed to stop session: {}", e);
                None
            }
        };

        let watchers: Vec<_> = self.watchers.lock().await.drain(..).collect();
        for watcher in watchers {
            if !watcher.is_finished() {
                info!("Waiting for a session close in progress");
            }
            if let Err(e) = watcher.await {
                error!("Stop watcher failed: {}", e);
            }
        }

        report
    }

    /// Stop the running session and return its report
    pub async fn stop(&self) -> Result<SessionReport, SessionError> {
        let active = self
            .active
            .lock()
            .await
            .take()
            .ok_or(SessionError::NoActiveSession)?;

        Ok(self.close(active).await)
    }

    async fn stop_session(&self, session_id: &str) -> Result<SessionReport, SessionError> {
        let active = {
            let mut slot = self.active.lock().await;
            match slot.as_ref() {
                Some(active) if active.log.session_id() == session_id => slot.take(),
                _ => None,
            }
        }
        .ok_or(SessionError::NoActiveSession)?;

        Ok(self.close(active).await)
    }

    async fn close(&self, active: ActiveSession) -> SessionReport {
        let ActiveSession {
            log,
            cancel,
            titles,
            chunks,
            transcript,
            producers,
            gate,
        } = active;

        info!("Stopping session {}", log.session_id());
        cancel.cancel();
        drop(titles);
        drop(chunks);

        let aborts: Vec<_> = producers.iter().map(|p| p.abort_handle()).collect();
        let drained = tokio::time::timeout(self.config.stop_timeout, async {
            for producer in producers {
                if let Err(e) = producer.await {
                    error!("Producer task failed: {}", e);
                }
            }
            gate.await
        })
        .await;

        let (producers_stopped, gate_stats) = match drained {
            Ok(Ok(stats)) => (true, Some(stats)),
            Ok(Err(e)) => {
                error!("Writer gate task failed: {}", e);
                (true, None)
            }
            Err(_) => {
                warn!(
                    "Producers did not stop within {:?}, sealing session anyway",
                    self.config.stop_timeout
                );
                aborts.iter().for_each(|a| a.abort());
                (false, None)
            }
        };

        // From here on producer appends are rejected.
        log.seal().await;

        let mut failure = None;
        if let Err(e) = self.append_final_analysis(&log, &transcript).await {
            error!("Failed to log final analysis: {}", e);
            failure = Some(e.to_string());
        }

        let ended_at = log.closing_time().await;
        let mut provisional = log.snapshot().await;
        provisional.ended_at = Some(ended_at);
        let summary = reduce_session(&provisional, &self.config.policy);

        let (session, summary) = match log.finalize_at(ended_at, summary).await {
            Ok(session) => (session, summary),
            Err(e) => {
                error!("Session {} did not finalize cleanly: {}", log.session_id(), e);
                failure.get_or_insert(e.to_string());
                let session = log.snapshot().await;
                let summary = session.summary.unwrap_or(Summary {
                    verdict: Verdict::Pending,
                    ..summary
                });
                (session, summary)
            }
        };

        SessionReport {
            session,
            summary,
            gate: gate_stats,
            producers_stopped,
            error: failure,
        }
    }

    /// Evaluate the whole transcript and log it as FINAL_ANALYSIS
    ///
    /// An unavailable evaluator is not an error here: the session simply ends
    /// without a final analysis and scores a soft score of 0.
    async fn append_final_analysis(
        &self,
        log: &EventLog,
        transcript: &TranscriptBuffer,
    ) -> Result<(), SessionError> {
        let text = transcript.full_text().await;
        if text.trim().is_empty() {
            info!("No transcript available, skipping final analysis");
            return Ok(());
        }

        info!("Running final analysis over {} transcript chunks", transcript.len().await);

        let evaluated = tokio::time::timeout(
            self.config.final_analysis_timeout,
            self.evaluator.evaluate(&text),
        )
        .await
        .unwrap_or_else(|_| {
            Err(EvaluationError::Unavailable(
                "final analysis timed out".to_string(),
            ))
        });

        match evaluated {
            Ok(scores) => {
                info!("Final analysis: {}", scores.comment);
                let payload = EventPayload::FinalAnalysis(FinalAnalysis {
                    scores,
                    transcript: Some(text),
                });
                log.append_final(payload).await?;
            }
            Err(e) => warn!("Final analysis unavailable, soft score falls back to 0: {}", e),
        }

        Ok(())
    }

    /// Forward a polled window title to the activity monitor
    pub async fn push_title(&self, title: impl Into<String>) -> Result<(), SessionError> {
        let (session_id, sender) = self.sender(|a| a.titles.clone()).await?;
        sender
            .send(title.into())
            .await
            .map_err(|_| SessionError::SessionClosed { session_id })
    }

    /// Forward a transcript chunk to the clarity pipeline
    pub async fn push_transcript(&self, text: impl Into<String>) -> Result<(), SessionError> {
        let (session_id, sender) = self.sender(|a| a.chunks.clone()).await?;
        sender
            .send(text.into())
            .await
            .map_err(|_| SessionError::SessionClosed { session_id })
    }

    async fn sender(
        &self,
        pick: impl FnOnce(&ActiveSession) -> mpsc::Sender<String>,
    ) -> Result<(String, mpsc::Sender<String>), SessionError> {
        if let Some(active) = self.active.lock().await.as_ref() {
            if !active.cancel.is_cancelled() {
                return Ok((active.log.session_id().to_string(), pick(active)));
            }
        }

        match self.store.current().await {
            Some(log) => Err(SessionError::SessionClosed {
                session_id: log.session_id().to_string(),
            }),
            None => Err(SessionError::NoActiveSession),
        }
    }

    /// Latest session, open or closed
    pub async fn snapshot(&self) -> Option<Session> {
        let log = self.store.current().await?;
        Some(log.snapshot().await)
    }

    pub async fn stats(&self) -> Option<SessionStats> {
        let log = self.store.current().await?;
        let session = log.snapshot().await;
        Some(SessionStats::from_session(&session, log.elapsed()))
    }

    /// Id of the session accepting input, if any
    pub async fn active_session_id(&self) -> Option<String> {
        self.active
            .lock()
            .await
            .as_ref()
            .filter(|a| !a.cancel.is_cancelled())
            .map(|a| a.log.session_id().to_string())
    }

    /// Whether a session is running and has not been asked to stop
    pub async fn is_active(&self) -> bool {
        self.active_session_id().await.is_some()
    }
}
