use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Activity state derived from the focused window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityState {
    Coding,
    Researching,
    Idle,
}

impl fmt::Display for ActivityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ActivityState::Coding => "CODING",
            ActivityState::Researching => "RESEARCHING",
            ActivityState::Idle => "IDLE",
        };
        f.write_str(label)
    }
}

/// Payload of a STATE event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatePayload {
    pub state: ActivityState,
}

/// Clarity triple produced by an evaluator (CLARITY payload)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClarityScores {
    /// Logical flow of the explanation (0-100)
    pub coherence: u8,

    /// Use of technical vocabulary (0-100)
    pub terminology: u8,

    /// Coverage of problem, solution and edge cases (0-100)
    pub completeness: u8,

    /// Free-text remark from the evaluator
    pub comment: String,
}

impl ClarityScores {
    /// Mean of the three dimensions, rounded to the nearest integer
    pub fn mean(&self) -> u8 {
        let sum = u32::from(self.coherence) + u32::from(self.terminology) + u32::from(self.completeness);
        (f64::from(sum) / 3.0).round().clamp(0.0, 100.0) as u8
    }
}

/// Payload of the FINAL_ANALYSIS event, computed once over the whole transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalAnalysis {
    #[serde(flatten)]
    pub scores: ClarityScores,

    /// Full transcript the analysis was derived from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
}

/// Typed event payload; serialized as `"type"` + `"payload"`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventPayload {
    State(StatePayload),
    Clarity(ClarityScores),
    FinalAnalysis(FinalAnalysis),
}

impl EventPayload {
    pub fn state(state: ActivityState) -> Self {
        EventPayload::State(StatePayload { state })
    }

    /// Short label used in log lines
    pub fn kind(&self) -> &'static str {
        match self {
            EventPayload::State(_) => "STATE",
            EventPayload::Clarity(_) => "CLARITY",
            EventPayload::FinalAnalysis(_) => "FINAL_ANALYSIS",
        }
    }
}

/// A single timestamped fact in the session log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Seconds elapsed since the session started
    pub ts: f64,

    #[serde(flatten)]
    pub payload: EventPayload,
}

/// Final recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Pass,
    Fail,
    /// The session could not be finalized cleanly
    Pending,
}

/// Terminal scores of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub hard_score: u8,
    pub soft_score: u8,
    pub verdict: Verdict,
}

/// One candidate's audited interview attempt
///
/// `ended_at` and `summary` are set together by finalization and never apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub candidate_id: String,

    /// Unix seconds
    pub started_at: f64,

    pub events: Vec<Event>,

    /// Unix seconds, present once finalized
    pub ended_at: Option<f64>,

    pub summary: Option<Summary>,
}

impl Session {
    pub fn new(candidate_id: impl Into<String>) -> Self {
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            candidate_id: candidate_id.into(),
            started_at: unix_seconds(Utc::now()),
            events: Vec::new(),
            ended_at: None,
            summary: None,
        }
    }

    pub fn is_finalized(&self) -> bool {
        self.summary.is_some()
    }

    /// Timestamp of the most recent event, or 0 for an empty log
    pub fn last_ts(&self) -> f64 {
        self.events.last().map(|e| e.ts).unwrap_or(0.0)
    }

    /// Session end expressed on the event clock (seconds since start)
    pub fn end_ts(&self) -> Option<f64> {
        self.ended_at.map(|ended| ended - self.started_at)
    }

    /// Number of events of the given kind
    pub fn count(&self, kind: &str) -> usize {
        self.events.iter().filter(|e| e.payload.kind() == kind).count()
    }
}

/// Wall-clock time as fractional unix seconds
pub fn unix_seconds(at: DateTime<Utc>) -> f64 {
    at.timestamp_micros() as f64 / 1_000_000.0
}

/// Event timestamps are kept at centisecond precision
pub fn round_ts(ts: f64) -> f64 {
    (ts.max(0.0) * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_wire_format() {
        let event = Event {
            ts: 1.5,
            payload: EventPayload::state(ActivityState::Researching),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["ts"], 1.5);
        assert_eq!(json["type"], "STATE");
        assert_eq!(json["payload"]["state"], "RESEARCHING");

        let back: Event = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_final_analysis_omits_missing_transcript() {
        let payload = EventPayload::FinalAnalysis(FinalAnalysis {
            scores: ClarityScores {
                coherence: 70,
                terminology: 80,
                completeness: 60,
                comment: "ok".to_string(),
            },
            transcript: None,
        });

        let json = serde_json::to_value(Event { ts: 0.0, payload }).unwrap();
        assert_eq!(json["type"], "FINAL_ANALYSIS");
        assert_eq!(json["payload"]["coherence"], 70);
        assert!(json["payload"].get("transcript").is_none());
    }

    #[test]
    fn test_open_session_serializes_nulls() {
        let session = Session::new("dev_01");
        let json = serde_json::to_value(&session).unwrap();

        assert!(json["ended_at"].is_null());
        assert!(json["summary"].is_null());
        assert_eq!(json["candidate_id"], "dev_01");
    }

    #[test]
    fn test_clarity_mean_rounds() {
        let scores = ClarityScores {
            coherence: 70,
            terminology: 80,
            completeness: 61,
            comment: String::new(),
        };
        assert_eq!(scores.mean(), 70);
    }

    #[test]
    fn test_round_ts() {
        assert_eq!(round_ts(1.234), 1.23);
        assert_eq!(round_ts(-0.5), 0.0);
    }
}
