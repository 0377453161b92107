//! Session event log
//!
//! This module owns the ordered event sequence of a session:
//! - `EventLog` - lock-guarded append/finalize/snapshot handle for one session
//! - `EventLogStore` - creates logs, one open session at a time
//! - `WriterGate` - bounded channel serializing concurrent producers into a log
//! - `JsonLogSink` - atomic JSON persistence after every mutation

mod event_log;
mod gate;
mod model;
mod persist;
mod store;

pub use event_log::{EventLog, Phase};
pub use gate::{GateSender, GateStats, Submission, WriterGate};
pub use model::{
    round_ts, unix_seconds, ActivityState, ClarityScores, Event, EventPayload, FinalAnalysis,
    Session, StatePayload, Summary, Verdict,
};
pub use persist::{read_session, JsonLogSink, SESSION_LOG_FILE};
pub use store::EventLogStore;
