use super::evaluator::ClarityEvaluator;
use crate::log::{EventPayload, GateSender};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Transcript accumulated over a session
#[derive(Clone, Default)]
pub struct TranscriptBuffer {
    chunks: Arc<Mutex<Vec<String>>>,
}

impl TranscriptBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push(&self, chunk: impl Into<String>) {
        self.chunks.lock().await.push(chunk.into());
    }

    /// All chunks joined with single spaces
    pub async fn full_text(&self) -> String {
        self.chunks.lock().await.join(" ")
    }

    pub async fn len(&self) -> usize {
        self.chunks.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Turns transcript chunks into CLARITY events
///
/// Evaluation happens here, outside the event log lock; only the resulting
/// scores go through the writer gate.
pub struct ClarityPipeline {
    evaluator: Arc<dyn ClarityEvaluator>,
    gate: GateSender,
    transcript: TranscriptBuffer,
    min_words: usize,
}

impl ClarityPipeline {
    pub fn new(
        evaluator: Arc<dyn ClarityEvaluator>,
        gate: GateSender,
        transcript: TranscriptBuffer,
        min_words: usize,
    ) -> Self {
        Self {
            evaluator,
            gate,
            transcript,
            min_words,
        }
    }

    fn is_substantial(&self, chunk: &str) -> bool {
        chunk.split_whitespace().count() >= self.min_words
    }

    /// Run until cancelled or the chunk feed closes; returns the number of CLARITY events submitted
    pub async fn run(self, mut chunks: mpsc::Receiver<String>, cancel: CancellationToken) -> usize {
        info!("Clarity pipeline started ({} evaluator)", self.evaluator.name());
        let mut submitted = 0;

        loop {
            let chunk = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                chunk = chunks.recv() => match chunk {
                    Some(chunk) => chunk,
                    None => break,
                },
            };

            if !self.is_substantial(&chunk) {
                debug!("Skipping short transcript chunk: {:?}", chunk);
                continue;
            }
            let chunk = chunk.trim().to_string();

            self.transcript.push(chunk.clone()).await;

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                result = self.evaluator.evaluate(&chunk) => result,
            };

            let scores = match result {
                Ok(scores) => scores,
                Err(e) => {
                    warn!("Clarity evaluation failed, chunk skipped: {}", e);
                    continue;
                }
            };

            info!(
                "Clarity: coherence={} terminology={} completeness={}",
                scores.coherence, scores.terminology, scores.completeness
            );

            if let Err(e) = self.gate.submit(EventPayload::Clarity(scores)).await {
                warn!("Clarity pipeline stopping: {}", e);
                break;
            }
            submitted += 1;
        }

        // Chunks still queued at stop only feed the final analysis.
        chunks.close();
        while let Some(chunk) = chunks.recv().await {
            if self.is_substantial(&chunk) {
                self.transcript.push(chunk.trim()).await;
            }
        }

        info!("Clarity pipeline stopped ({} evaluations logged)", submitted);
        submitted
    }
}
