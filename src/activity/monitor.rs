use super::classifier::StateTracker;
use crate::error::SessionError;
use crate::log::{EventPayload, GateSender};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Turns polled window titles into STATE events
///
/// The external window sensor sends one title per poll tick; only state
/// transitions reach the event log.
pub struct ActivityMonitor {
    gate: GateSender,
    tracker: StateTracker,
    transitions: usize,
}

impl ActivityMonitor {
    pub fn new(gate: GateSender) -> Self {
        Self {
            gate,
            tracker: StateTracker::new(),
            transitions: 0,
        }
    }

    /// Run until cancelled or the title feed closes; returns the number of transitions logged
    ///
    /// Titles already queued when the stop signal arrives are still classified.
    pub async fn run(mut self, mut titles: mpsc::Receiver<String>, cancel: CancellationToken) -> usize {
        info!("Activity monitor started");

        loop {
            let title = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                title = titles.recv() => match title {
                    Some(title) => title,
                    None => break,
                },
            };

            if let Err(e) = self.observe(&title).await {
                warn!("Activity monitor stopping: {}", e);
                return self.transitions;
            }
        }

        titles.close();
        while let Some(title) = titles.recv().await {
            if let Err(e) = self.observe(&title).await {
                warn!("Dropping queued titles: {}", e);
                break;
            }
        }

        info!("Activity monitor stopped ({} transitions)", self.transitions);
        self.transitions
    }

    async fn observe(&mut self, title: &str) -> Result<(), SessionError> {
        let Some(state) = self.tracker.observe(title) else {
            return Ok(());
        };

        info!("Activity: {} | {}", state, title.chars().take(50).collect::<String>());

        self.gate.submit(EventPayload::state(state)).await?;
        self.transitions += 1;
        Ok(())
    }
}
