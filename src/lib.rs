pub mod activity;
pub mod clarity;
pub mod config;
pub mod error;
pub mod http;
pub mod log;
pub mod nats;
pub mod scoring;
pub mod session;

pub use activity::{classify, ActivityMonitor, StateTracker};
pub use clarity::{ClarityEvaluator, ClarityPipeline, EvaluatorFactory, StubEvaluator, TranscriptBuffer};
pub use config::Config;
pub use error::{EvaluationError, SessionError};
pub use http::{create_router, AppState};
pub use log::{
    ActivityState, ClarityScores, Event, EventLog, EventLogStore, EventPayload, FinalAnalysis,
    Session, Summary, Verdict, WriterGate,
};
pub use nats::{NatsClient, TranscriptFeed, TranscriptMessage};
pub use scoring::{reduce, reduce_session, ScoringPolicy};
pub use session::{SessionConfig, SessionHandle, SessionManager, SessionReport, SessionStats};
