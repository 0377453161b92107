use super::state::AppState;
use crate::error::SessionError;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct StartSessionRequest {
    pub candidate_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StartSessionResponse {
    pub session_id: String,
    pub candidate_id: String,
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ActivityRequest {
    /// Raw title of the focused window
    pub title: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TranscriptRequest {
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: impl ToString) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
        .into_response()
}

fn session_error(e: SessionError) -> Response {
    let status = match &e {
        SessionError::AlreadyActive { .. }
        | SessionError::SessionClosed { .. }
        | SessionError::AlreadyFinalized { .. } => StatusCode::CONFLICT,
        SessionError::NoActiveSession => StatusCode::NOT_FOUND,
        SessionError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_response(status, e)
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /session/start
/// Open a new session
pub async fn start_session(
    State(state): State<AppState>,
    Json(req): Json<StartSessionRequest>,
) -> Response {
    let candidate_id = req.candidate_id.trim();
    if candidate_id.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "candidate_id must not be empty");
    }

    info!("Starting session for candidate: {}", candidate_id);

    match state.manager.start(candidate_id).await {
        Ok(handle) => (
            StatusCode::OK,
            Json(StartSessionResponse {
                session_id: handle.session_id().to_string(),
                candidate_id: candidate_id.to_string(),
                status: "open".to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            warn!("Failed to start session: {}", e);
            session_error(e)
        }
    }
}

/// POST /session/stop
/// Stop the active session and return its report
pub async fn stop_session(State(state): State<AppState>) -> Response {
    match state.manager.stop().await {
        Ok(report) => {
            if let Some(e) = &report.error {
                error!("Session closed with error: {}", e);
            }
            (StatusCode::OK, Json(report)).into_response()
        }
        Err(e) => session_error(e),
    }
}

/// POST /session/activity
/// Feed a window title to the activity monitor
pub async fn push_activity(
    State(state): State<AppState>,
    Json(req): Json<ActivityRequest>,
) -> Response {
    match state.manager.push_title(req.title).await {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(e) => session_error(e),
    }
}

/// POST /session/transcript
/// Feed a transcript chunk to the clarity pipeline
pub async fn push_transcript(
    State(state): State<AppState>,
    Json(req): Json<TranscriptRequest>,
) -> Response {
    match state.manager.push_transcript(req.text).await {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(e) => session_error(e),
    }
}

/// GET /session
/// Snapshot of the latest session, open or closed
pub async fn get_session(State(state): State<AppState>) -> Response {
    match state.manager.snapshot().await {
        Some(session) => (StatusCode::OK, Json(session)).into_response(),
        None => session_error(SessionError::NoActiveSession),
    }
}

/// GET /session/stats
pub async fn get_session_stats(State(state): State<AppState>) -> Response {
    match state.manager.stats().await {
        Some(stats) => (StatusCode::OK, Json(stats)).into_response(),
        None => session_error(SessionError::NoActiveSession),
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
