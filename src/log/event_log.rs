use super::model::{round_ts, Event, EventPayload, Session, Summary, Verdict};
use super::persist::JsonLogSink;
use crate::error::SessionError;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Intake phase of a session log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Producers may append
    Open,
    /// Producer intake stopped; only the controller may append its final analysis
    Sealed,
    /// Summary written, log immutable
    Closed,
}

struct LogState {
    session: Session,
    phase: Phase,
}

struct LogInner {
    state: RwLock<LogState>,
    clock: Instant,
    sink: Option<JsonLogSink>,
}

/// Handle to one session's append-only event log
///
/// Cloning is cheap; every clone refers to the same log. All mutation goes through a
/// single write lock which is held for exactly one append or finalize (and the
/// snapshot write that follows it), so readers see either the state before or after
/// a mutation, never part of one.
#[derive(Clone)]
pub struct EventLog {
    inner: Arc<LogInner>,
    session_id: String,
    started_at: f64,
}

impl EventLog {
    /// Start a new session log and persist its initial document
    pub async fn open(
        candidate_id: impl Into<String>,
        sink: Option<JsonLogSink>,
    ) -> Result<Self, SessionError> {
        let session = Session::new(candidate_id);
        let session_id = session.session_id.clone();
        let started_at = session.started_at;

        if let Some(sink) = &sink {
            sink.write(&session).await?;
        }

        info!(
            "Opened session log {} for candidate {}",
            session_id, session.candidate_id
        );

        Ok(Self {
            inner: Arc::new(LogInner {
                state: RwLock::new(LogState {
                    session,
                    phase: Phase::Open,
                }),
                clock: Instant::now(),
                sink,
            }),
            session_id,
            started_at,
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Unix seconds at which the session started
    pub fn started_at(&self) -> f64 {
        self.started_at
    }

    /// Seconds since the session started, on a monotonic clock
    pub fn elapsed(&self) -> f64 {
        self.inner.clock.elapsed().as_secs_f64()
    }

    pub async fn phase(&self) -> Phase {
        self.inner.state.read().await.phase
    }

    pub async fn is_closed(&self) -> bool {
        self.phase().await == Phase::Closed
    }

    /// Append a producer event stamped with the store clock
    pub async fn append(&self, payload: EventPayload) -> Result<Event, SessionError> {
        self.insert(None, payload, false).await
    }

    /// Append a producer event with a caller-supplied timestamp
    ///
    /// A timestamp earlier than the last logged event is raised to it; one that is not
    /// finite is replaced by the store clock.
    pub async fn append_at(&self, ts: f64, payload: EventPayload) -> Result<Event, SessionError> {
        self.insert(Some(ts), payload, false).await
    }

    /// Append on behalf of the lifecycle controller; accepted while sealed
    pub async fn append_final(&self, payload: EventPayload) -> Result<Event, SessionError> {
        self.insert(None, payload, true).await
    }

    async fn insert(
        &self,
        ts: Option<f64>,
        payload: EventPayload,
        privileged: bool,
    ) -> Result<Event, SessionError> {
        let mut state = self.inner.state.write().await;

        let accepting = match state.phase {
            Phase::Open => true,
            Phase::Sealed => privileged,
            Phase::Closed => false,
        };
        if !accepting {
            warn!(
                "Rejected {} event for session {} ({:?})",
                payload.kind(),
                self.session_id,
                state.phase
            );
            return Err(SessionError::SessionClosed {
                session_id: self.session_id.clone(),
            });
        }

        // Non-finite caller timestamps would poison every later ts and the JSON document.
        let requested = match ts {
            Some(ts) if round_ts(ts).is_finite() && !ts.is_nan() => round_ts(ts),
            Some(ts) => {
                warn!("Ignoring non-finite ts {} for session {}", ts, self.session_id);
                round_ts(self.elapsed())
            }
            None => round_ts(self.elapsed()),
        };
        let last = state.session.last_ts();
        if requested < last && ts.is_some() {
            debug!("Raising out-of-order ts {:.2} to {:.2}", requested, last);
        }

        let event = Event {
            ts: requested.max(last),
            payload,
        };
        state.session.events.push(event.clone());

        // Memory never runs ahead of disk: a failed write takes the event back out.
        if let Some(sink) = &self.inner.sink {
            if let Err(e) = sink.write(&state.session).await {
                state.session.events.pop();
                return Err(e);
            }
        }

        Ok(event)
    }

    /// Stop producer intake; returns false if the log was not open
    pub async fn seal(&self) -> bool {
        let mut state = self.inner.state.write().await;
        if state.phase != Phase::Open {
            return false;
        }
        state.phase = Phase::Sealed;
        info!("Sealed session {} ({} events)", self.session_id, state.session.events.len());
        true
    }

    /// Unix time the session would end at if closed now
    ///
    /// Never earlier than the last logged event.
    pub async fn closing_time(&self) -> f64 {
        let state = self.inner.state.read().await;
        let end_ts = self.elapsed().max(state.session.last_ts());
        self.started_at + end_ts
    }

    /// Finalize the session now
    pub async fn finalize(&self, summary: Summary) -> Result<Session, SessionError> {
        let ended_at = self.closing_time().await;
        self.finalize_at(ended_at, summary).await
    }

    /// Write the summary and end time together and close the log
    ///
    /// If the closing write fails the session still closes, with its verdict
    /// downgraded to PENDING, and the persistence error is returned.
    pub async fn finalize_at(
        &self,
        ended_at: f64,
        summary: Summary,
    ) -> Result<Session, SessionError> {
        let mut state = self.inner.state.write().await;

        if state.session.is_finalized() {
            warn!("Session {} already finalized", self.session_id);
            return Err(SessionError::AlreadyFinalized {
                session_id: self.session_id.clone(),
            });
        }

        let mut closed = state.session.clone();
        closed.ended_at = Some(ended_at.max(self.started_at + closed.last_ts()));
        closed.summary = Some(summary);

        let written = match &self.inner.sink {
            Some(sink) => sink.write(&closed).await,
            None => Ok(()),
        };

        if written.is_err() {
            closed.summary = Some(Summary {
                verdict: Verdict::Pending,
                ..summary
            });
        }

        state.session = closed;
        state.phase = Phase::Closed;

        info!(
            "Finalized session {}: hard={} soft={} verdict={:?}",
            self.session_id, summary.hard_score, summary.soft_score, summary.verdict
        );

        written.map(|_| state.session.clone())
    }

    /// Consistent read-only copy of the session
    pub async fn snapshot(&self) -> Session {
        self.inner.state.read().await.session.clone()
    }

    pub async fn len(&self) -> usize {
        self.inner.state.read().await.session.events.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::model::ActivityState;

    #[tokio::test]
    async fn test_caller_ts_is_raised_to_last() {
        let log = EventLog::open("c", None).await.unwrap();
        log.append_at(5.0, EventPayload::state(ActivityState::Coding))
            .await
            .unwrap();
        let event = log
            .append_at(3.0, EventPayload::state(ActivityState::Idle))
            .await
            .unwrap();

        assert_eq!(event.ts, 5.0);
    }

    #[tokio::test]
    async fn test_sealed_log_accepts_only_final() {
        let log = EventLog::open("c", None).await.unwrap();
        assert!(log.seal().await);
        assert!(!log.seal().await);

        let rejected = log.append(EventPayload::state(ActivityState::Coding)).await;
        assert!(matches!(rejected, Err(SessionError::SessionClosed { .. })));

        log.append_final(EventPayload::state(ActivityState::Idle))
            .await
            .unwrap();
        assert_eq!(log.len().await, 1);
        assert_eq!(log.phase().await, Phase::Sealed);
    }
}
