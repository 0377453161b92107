//! Score reducer
//!
//! Folds a session's event log into hard and soft scores and a verdict. The reducer
//! is a pure function of the events and the session end; it never reads the clock.

use crate::log::{ActivityState, Event, EventPayload, Session, Summary, Verdict};
use serde::{Deserialize, Serialize};

/// Scoring parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringPolicy {
    /// Minimum combined score `(hard + soft) / 2` for PASS; ties pass
    pub pass_threshold: f64,

    /// Share of RESEARCHING time credited toward the hard score
    pub research_weight: f64,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            pass_threshold: 60.0,
            research_weight: 0.5,
        }
    }
}

/// Seconds spent in each activity state
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StateDurations {
    pub coding: f64,
    pub researching: f64,
    pub idle: f64,
}

impl StateDurations {
    pub fn total(&self) -> f64 {
        self.coding + self.researching + self.idle
    }

    fn add(&mut self, state: ActivityState, secs: f64) {
        match state {
            ActivityState::Coding => self.coding += secs,
            ActivityState::Researching => self.researching += secs,
            ActivityState::Idle => self.idle += secs,
        }
    }
}

/// Integrate how long each state held
///
/// A state runs until the next STATE event that differs from it; the last one runs
/// until `end_ts`. Repeated identical STATE events extend the current run.
pub fn state_durations(events: &[Event], end_ts: f64) -> StateDurations {
    let mut durations = StateDurations::default();
    let mut current: Option<(ActivityState, f64)> = None;

    for event in events {
        let EventPayload::State(payload) = &event.payload else {
            continue;
        };

        match current {
            Some((state, _)) if state == payload.state => {}
            Some((state, since)) => {
                durations.add(state, (event.ts - since).max(0.0));
                current = Some((payload.state, event.ts));
            }
            None => current = Some((payload.state, event.ts)),
        }
    }

    if let Some((state, since)) = current {
        durations.add(state, (end_ts - since).max(0.0));
    }

    durations
}

/// Weighted share of productive time, 0-100
pub fn hard_score(durations: &StateDurations, policy: &ScoringPolicy) -> u8 {
    let total = durations.total();
    if total <= 0.0 {
        return 0;
    }

    let credited = durations.coding + policy.research_weight * durations.researching;
    (100.0 * credited / total).round().clamp(0.0, 100.0) as u8
}

/// Mean of the last FINAL_ANALYSIS triple, or 0 when the session has none
pub fn soft_score(events: &[Event]) -> u8 {
    events
        .iter()
        .rev()
        .find_map(|event| match &event.payload {
            EventPayload::FinalAnalysis(analysis) => Some(analysis.scores.mean()),
            _ => None,
        })
        .unwrap_or(0)
}

pub fn verdict(hard: u8, soft: u8, policy: &ScoringPolicy) -> Verdict {
    let combined = (f64::from(hard) + f64::from(soft)) / 2.0;
    if combined >= policy.pass_threshold {
        Verdict::Pass
    } else {
        Verdict::Fail
    }
}

/// Reduce an event sequence that ends at `end_ts` seconds after the session start
pub fn reduce(events: &[Event], end_ts: f64, policy: &ScoringPolicy) -> Summary {
    let last = events.last().map(|e| e.ts).unwrap_or(0.0);
    let durations = state_durations(events, end_ts.max(last));

    let hard = hard_score(&durations, policy);
    let soft = soft_score(events);

    Summary {
        hard_score: hard,
        soft_score: soft,
        verdict: verdict(hard, soft, policy),
    }
}

/// Reduce a session using its recorded end
///
/// An unfinalized session is scored up to its last event.
pub fn reduce_session(session: &Session, policy: &ScoringPolicy) -> Summary {
    let end_ts = session.end_ts().unwrap_or_else(|| session.last_ts());
    reduce(&session.events, end_ts, policy)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(ts: f64, state: ActivityState) -> Event {
        Event {
            ts,
            payload: EventPayload::state(state),
        }
    }

    #[test]
    fn test_repeated_state_extends_run() {
        let events = vec![
            state(0.0, ActivityState::Coding),
            state(4.0, ActivityState::Coding),
            state(6.0, ActivityState::Idle),
        ];

        let durations = state_durations(&events, 10.0);
        assert_eq!(durations.coding, 6.0);
        assert_eq!(durations.idle, 4.0);
        assert_eq!(durations.researching, 0.0);
    }

    #[test]
    fn test_time_before_first_state_is_not_counted() {
        let events = vec![state(5.0, ActivityState::Coding)];

        let durations = state_durations(&events, 15.0);
        assert_eq!(durations.total(), 10.0);
        assert_eq!(hard_score(&durations, &ScoringPolicy::default()), 100);
    }

    #[test]
    fn test_only_idle_scores_zero() {
        let events = vec![state(0.0, ActivityState::Idle)];
        let summary = reduce(&events, 20.0, &ScoringPolicy::default());

        assert_eq!(summary.hard_score, 0);
        assert_eq!(summary.verdict, Verdict::Fail);
    }

    #[test]
    fn test_threshold_tie_passes() {
        let policy = ScoringPolicy::default();
        assert_eq!(verdict(60, 60, &policy), Verdict::Pass);
        assert_eq!(verdict(59, 60, &policy), Verdict::Fail);
        assert_eq!(verdict(100, 20, &policy), Verdict::Pass);
    }

    #[test]
    fn test_research_weight_is_configurable() {
        let durations = StateDurations {
            coding: 0.0,
            researching: 10.0,
            idle: 0.0,
        };
        let policy = ScoringPolicy {
            research_weight: 0.25,
            ..ScoringPolicy::default()
        };

        assert_eq!(hard_score(&durations, &policy), 25);
    }
}
