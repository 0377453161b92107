use crate::config::{EvaluatorConfig, EvaluatorMode};
use crate::error::EvaluationError;
use crate::log::ClarityScores;
use anyhow::Result;
use serde_json::Value;
use std::sync::Arc;

/// Transcripts with fewer non-whitespace characters are never evaluated
pub const MIN_TRANSCRIPT_CHARS: usize = 5;

/// Evaluator comments are cut to this many characters
pub const MAX_COMMENT_CHARS: usize = 500;

/// Scores an explanation on coherence, terminology and completeness
///
/// Implementations:
/// - `StubEvaluator`: deterministic local heuristic (tests, offline runs)
/// - `OpenAiEvaluator`: OpenAI-compatible chat completions API
#[async_trait::async_trait]
pub trait ClarityEvaluator: Send + Sync {
    async fn evaluate(&self, transcript: &str) -> Result<ClarityScores, EvaluationError>;

    /// Evaluator name for logging
    fn name(&self) -> &str;
}

/// Evaluator factory
pub struct EvaluatorFactory;

impl EvaluatorFactory {
    pub fn create(config: &EvaluatorConfig) -> Result<Arc<dyn ClarityEvaluator>> {
        match config.mode {
            EvaluatorMode::Fake => Ok(Arc::new(super::stub::StubEvaluator::new())),
            EvaluatorMode::Openai => {
                let Some(api_key) = config.api_key.clone() else {
                    anyhow::bail!(
                        "No API key configured for the openai evaluator (set {} or use mode = \"fake\")",
                        crate::config::API_KEY_ENV
                    );
                };
                Ok(Arc::new(super::openai::OpenAiEvaluator::new(config, api_key)?))
            }
        }
    }
}

/// Reject transcripts too short to say anything about
pub fn check_transcript(transcript: &str) -> Result<(), EvaluationError> {
    let chars = transcript.chars().filter(|c| !c.is_whitespace()).count();
    if chars < MIN_TRANSCRIPT_CHARS {
        return Err(EvaluationError::TranscriptTooShort);
    }
    Ok(())
}

/// Parse evaluator output into clarity scores
///
/// Accepts bare JSON or JSON wrapped in markdown fences or prose. All four fields are
/// required; scores are clamped to 0-100 and the comment is truncated.
pub fn parse_scores(content: &str) -> Result<ClarityScores, EvaluationError> {
    let value = match serde_json::from_str::<Value>(content) {
        Ok(value) => value,
        Err(e) => extract_json(content)
            .ok_or_else(|| EvaluationError::InvalidResponse(format!("no JSON object: {}", e)))?,
    };

    Ok(ClarityScores {
        coherence: score_field(&value, "coherence")?,
        terminology: score_field(&value, "terminology")?,
        completeness: score_field(&value, "completeness")?,
        comment: comment_field(&value)?,
    })
}

fn extract_json(text: &str) -> Option<Value> {
    let text = text.replace("```json", "").replace("```", "");
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

fn score_field(value: &Value, field: &str) -> Result<u8, EvaluationError> {
    let raw = value
        .get(field)
        .ok_or_else(|| EvaluationError::InvalidResponse(format!("missing field: {}", field)))?;

    let score = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| EvaluationError::InvalidResponse(format!("invalid score for {}: {}", field, raw)))?;

    Ok(score.trunc().clamp(0.0, 100.0) as u8)
}

fn comment_field(value: &Value) -> Result<String, EvaluationError> {
    let raw = value
        .get("comment")
        .ok_or_else(|| EvaluationError::InvalidResponse("missing field: comment".to_string()))?;

    let comment = match raw {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    Ok(comment.chars().take(MAX_COMMENT_CHARS).collect())
}
