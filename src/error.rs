//! Error types for the session audit log

use thiserror::Error;

/// Errors raised by the event log and the session lifecycle
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// A second session was requested while one is still open
    #[error("Session {session_id} is already active")]
    AlreadyActive { session_id: String },

    /// Append attempted after the session stopped accepting events
    #[error("Session {session_id} is closed, event rejected")]
    SessionClosed { session_id: String },

    /// Finalize called on a session that already carries a summary
    #[error("Session {session_id} is already finalized")]
    AlreadyFinalized { session_id: String },

    /// No session is active
    #[error("No active session")]
    NoActiveSession,

    /// The session log could not be written to disk
    #[error("Failed to persist session log: {0}")]
    Persistence(String),
}

/// Errors from a clarity evaluator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvaluationError {
    /// Not enough text to evaluate
    #[error("Transcript too short")]
    TranscriptTooShort,

    /// The evaluator could not be reached or did not answer in time
    #[error("Clarity evaluation unavailable: {0}")]
    Unavailable(String),

    /// The evaluator answered with something that is not a clarity triple
    #[error("Invalid evaluator response: {0}")]
    InvalidResponse(String),
}
