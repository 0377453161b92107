use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Session control
        .route("/session/start", post(handlers::start_session))
        .route("/session/stop", post(handlers::stop_session))
        // Producer input
        .route("/session/activity", post(handlers::push_activity))
        .route("/session/transcript", post(handlers::push_transcript))
        // Dashboard queries
        .route("/session", get(handlers::get_session))
        .route("/session/stats", get(handlers::get_session_stats))
        // Dashboards poll from a browser on another origin
        .layer(CorsLayer::permissive())
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
