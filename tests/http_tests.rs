// HTTP API tests driven through the router without binding a socket

use anyhow::Result;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use glassbox::http::{create_router, AppState};
use glassbox::{SessionConfig, SessionManager, StubEvaluator};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

fn router() -> Router {
    let config = SessionConfig {
        final_analysis_timeout: Duration::from_secs(1),
        ..SessionConfig::default()
    };
    let manager = Arc::new(SessionManager::new(config, Arc::new(StubEvaluator::new())));
    create_router(AppState::new(manager))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> Result<(StatusCode, Value)> {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))?,
        None => request.body(Body::empty())?,
    };

    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::String(
            String::from_utf8_lossy(&bytes).into_owned(),
        ))
    };
    Ok((status, value))
}

#[tokio::test]
async fn test_health() -> Result<()> {
    let app = router();
    let (status, body) = send(&app, "GET", "/health", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("OK".to_string()));
    Ok(())
}

#[tokio::test]
async fn test_session_round_trip() -> Result<()> {
    let app = router();

    let (status, started) = send(
        &app,
        "POST",
        "/session/start",
        Some(json!({ "candidate_id": "hacker_007" })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(started["candidate_id"], "hacker_007");
    assert_eq!(started["status"], "open");
    let session_id = started["session_id"].as_str().unwrap_or_default().to_string();
    assert!(!session_id.is_empty());

    let (status, _) = send(
        &app,
        "POST",
        "/session/start",
        Some(json!({ "candidate_id": "someone_else" })),
    )
    .await?;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        "POST",
        "/session/activity",
        Some(json!({ "title": "main.rs - Visual Studio Code" })),
    )
    .await?;
    assert_eq!(status, StatusCode::ACCEPTED);

    let (status, _) = send(
        &app,
        "POST",
        "/session/transcript",
        Some(json!({ "text": "I iterate once and keep a hash map of seen values" })),
    )
    .await?;
    assert_eq!(status, StatusCode::ACCEPTED);

    let (status, live) = send(&app, "GET", "/session", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(live["session_id"], session_id.as_str());
    assert!(live["summary"].is_null());

    let (status, stats) = send(&app, "GET", "/session/stats", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["is_open"], true);

    let (status, report) = send(&app, "POST", "/session/stop", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["session"]["session_id"], session_id.as_str());
    assert!(report["summary"]["verdict"].is_string());
    assert_eq!(report["session"]["summary"], report["summary"]);
    assert_eq!(report["session"]["events"][0]["type"], "STATE");
    assert_eq!(report["session"]["events"][0]["payload"]["state"], "CODING");

    // Closed session: input conflicts, a second stop finds nothing to stop
    let (status, body) = send(
        &app,
        "POST",
        "/session/activity",
        Some(json!({ "title": "Stack Overflow" })),
    )
    .await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].is_string());

    let (status, _) = send(&app, "POST", "/session/stop", None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, closed) = send(&app, "GET", "/session", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(closed["summary"], report["summary"]);

    Ok(())
}

#[tokio::test]
async fn test_requests_without_session() -> Result<()> {
    let app = router();

    let (status, _) = send(&app, "GET", "/session", None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        "POST",
        "/session/transcript",
        Some(json!({ "text": "hello world" })),
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "POST", "/session/stop", None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn test_blank_candidate_is_rejected() -> Result<()> {
    let app = router();

    let (status, body) = send(
        &app,
        "POST",
        "/session/start",
        Some(json!({ "candidate_id": "  " })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "candidate_id must not be empty");

    Ok(())
}
