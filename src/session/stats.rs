use crate::log::{GateStats, Session, Summary};
use serde::Serialize;

/// Live counters for a session
#[derive(Debug, Clone, Serialize)]
pub struct SessionStats {
    pub session_id: String,
    pub candidate_id: String,

    /// Whether producers may still append
    pub is_open: bool,

    /// Seconds since the session started (or its total length once closed)
    pub duration_secs: f64,

    pub state_changes: usize,
    pub clarity_evaluations: usize,
    pub has_final_analysis: bool,
}

impl SessionStats {
    pub fn from_session(session: &Session, elapsed: f64) -> Self {
        Self {
            session_id: session.session_id.clone(),
            candidate_id: session.candidate_id.clone(),
            is_open: !session.is_finalized(),
            duration_secs: session.end_ts().unwrap_or(elapsed),
            state_changes: session.count("STATE"),
            clarity_evaluations: session.count("CLARITY"),
            has_final_analysis: session.count("FINAL_ANALYSIS") > 0,
        }
    }
}

/// Outcome of closing a session
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    /// The closed session as persisted
    pub session: Session,

    /// Final scores; verdict is PENDING if finalization did not complete cleanly
    pub summary: Summary,

    /// Writer gate counters, absent if the gate was still draining at the deadline
    pub gate: Option<GateStats>,

    /// Whether every producer acknowledged stop before the deadline
    pub producers_stopped: bool,

    /// Error that kept the session from closing cleanly
    pub error: Option<String>,
}
