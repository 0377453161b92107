use super::messages::TranscriptMessage;
use crate::session::SessionManager;
use futures::stream::StreamExt;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Forwards final STT transcripts from NATS to the active session
pub struct TranscriptFeed;

impl TranscriptFeed {
    /// Spawn the forwarding task; returns the number of chunks forwarded when it ends
    pub fn spawn(
        mut subscriber: async_nats::Subscriber,
        manager: Arc<SessionManager>,
        shutdown: CancellationToken,
    ) -> JoinHandle<usize> {
        tokio::spawn(async move {
            info!("Transcript feed started");
            let mut forwarded = 0;

            loop {
                let msg = tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => break,
                    msg = subscriber.next() => match msg {
                        Some(msg) => msg,
                        None => break,
                    },
                };

                let transcript = match serde_json::from_slice::<TranscriptMessage>(&msg.payload) {
                    Ok(transcript) => transcript,
                    Err(e) => {
                        warn!("Failed to parse transcript message: {}", e);
                        continue;
                    }
                };

                let Some(session_id) = manager.active_session_id().await else {
                    debug!("No active session, dropping transcript");
                    continue;
                };
                if !transcript.is_for(&session_id) {
                    continue;
                }

                match manager.push_transcript(transcript.text).await {
                    Ok(()) => forwarded += 1,
                    Err(e) => warn!("Transcript not forwarded: {}", e),
                }
            }

            info!("Transcript feed stopped ({} chunks forwarded)", forwarded);
            forwarded
        })
    }
}
