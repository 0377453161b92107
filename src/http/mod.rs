//! HTTP API for session control and dashboard polling
//!
//! - POST /session/start - Open a session for a candidate
//! - POST /session/stop - Stop and finalize the active session
//! - POST /session/activity - Push a polled window title
//! - POST /session/transcript - Push a transcript chunk
//! - GET /session - Read-only snapshot of the latest session
//! - GET /session/stats - Live counters
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use handlers::{
    ActivityRequest, ErrorResponse, StartSessionRequest, StartSessionResponse, TranscriptRequest,
};
pub use routes::create_router;
pub use state::AppState;
