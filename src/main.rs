use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use glassbox::log::read_session;
use glassbox::{
    create_router, reduce_session, AppState, Config, EvaluatorFactory, NatsClient, ScoringPolicy,
    SessionConfig, SessionManager, TranscriptFeed,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "glassbox", version, about = "Audit log and scoring for interview sessions")]
struct Cli {
    /// Config file (extension optional)
    #[arg(short, long, global = true, default_value = "config/glassbox")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API; Ctrl-C finalizes the active session and exits
    Serve {
        /// Open a session for this candidate right away
        #[arg(long)]
        candidate: Option<String>,
    },
    /// Re-score a persisted session log
    Score {
        /// Path to a session_log.json
        log: PathBuf,

        #[arg(long)]
        threshold: Option<f64>,

        #[arg(long)]
        research_weight: Option<f64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    match cli.command {
        Command::Serve { candidate } => serve(cfg, candidate).await,
        Command::Score {
            log,
            threshold,
            research_weight,
        } => {
            let policy = ScoringPolicy {
                pass_threshold: threshold.unwrap_or(cfg.session.pass_threshold),
                research_weight: research_weight.unwrap_or(cfg.session.research_weight),
            };
            score(log, policy).await
        }
    }
}

async fn serve(cfg: Config, candidate: Option<String>) -> Result<()> {
    info!("{} starting", cfg.service.name);

    let evaluator = EvaluatorFactory::create(&cfg.evaluator)?;
    info!("Clarity evaluator: {}", evaluator.name());

    let manager = Arc::new(SessionManager::new(SessionConfig::from_config(&cfg), evaluator));
    let shutdown = CancellationToken::new();

    let feed = if cfg.nats.enabled {
        let nats = NatsClient::connect(&cfg.nats.url).await?;
        let subscriber = nats.subscribe_transcripts(&cfg.nats.subject).await?;
        Some((
            nats,
            TranscriptFeed::spawn(subscriber, Arc::clone(&manager), shutdown.clone()),
        ))
    } else {
        None
    };

    if let Some(candidate) = candidate {
        let handle = manager.start(&candidate).await?;
        info!("Session {} opened for {}", handle.session_id(), candidate);
    }

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("HTTP API listening on {}", addr);

    let app = create_router(AppState::new(Arc::clone(&manager)));
    let signal = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl-C: {}", e);
            }
            info!("Interrupted, shutting down");
            signal.cancel();
        })
        .await
        .context("HTTP server failed")?;

    shutdown.cancel();

    // Also waits out a close the session's own stop signal already started.
    if let Some(report) = manager.shutdown().await {
        info!(
            "Final summary: hard={} soft={} verdict={:?}",
            report.summary.hard_score, report.summary.soft_score, report.summary.verdict
        );
        if let Some(e) = report.error {
            warn!("Session did not close cleanly: {}", e);
        }
    }

    if let Some((nats, feed)) = feed {
        if let Err(e) = feed.await {
            error!("Transcript feed failed: {}", e);
        }
        nats.close().await?;
    }

    Ok(())
}

async fn score(path: PathBuf, policy: ScoringPolicy) -> Result<()> {
    let session = read_session(&path).await?;

    if session.ended_at.is_none() {
        warn!("Session {} was never finalized; scoring up to its last event", session.session_id);
    }

    let recomputed = reduce_session(&session, &policy);
    let report = serde_json::json!({
        "session_id": session.session_id,
        "candidate_id": session.candidate_id,
        "events": session.events.len(),
        "stored": session.summary,
        "recomputed": recomputed,
        "matches": session.summary == Some(recomputed),
    });

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
