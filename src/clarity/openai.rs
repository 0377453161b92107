use super::evaluator::{check_transcript, parse_scores, ClarityEvaluator};
use crate::config::EvaluatorConfig;
use crate::error::EvaluationError;
use crate::log::ClarityScores;
use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

const SYSTEM_PROMPT: &str = r#"You are an expert technical interviewer rating a software engineer's spoken explanation of their problem-solving process.

Output ONLY a JSON object, no markdown and no prose:
{"coherence": <int 0-100>, "terminology": <int 0-100>, "completeness": <int 0-100>, "comment": "<at most 100 words>"}

coherence: does the explanation follow a logical path (problem, hypothesis, test, result)?
terminology: does the candidate use precise technical vocabulary (complexity, recursion, edge case, ...)?
completeness: does it cover the problem, the solution, edge cases and alternatives?

This is real-time speech captured while coding: be generous with hesitation and filler words. Score 0-9 only for nonsense or fewer than three words."#;

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: String,
}

enum Attempt {
    TimedOut,
    Failed(EvaluationError),
}

/// Clarity evaluator backed by an OpenAI-compatible chat completions endpoint
pub struct OpenAiEvaluator {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_retries: u32,
}

impl OpenAiEvaluator {
    pub fn new(config: &EvaluatorConfig, api_key: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
            max_retries: config.max_retries,
        })
    }

    async fn request(&self, transcript: &str) -> Result<String, Attempt> {
        let body = ChatRequest {
            model: &self.model,
            temperature: self.temperature,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: format!("Analyze this explanation:\n\n{}", transcript),
                },
            ],
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Attempt::TimedOut
                } else if e.is_connect() {
                    Attempt::Failed(EvaluationError::Unavailable(format!("connection error: {}", e)))
                } else {
                    Attempt::Failed(EvaluationError::Unavailable(e.to_string()))
                }
            })?;

        match response.status() {
            StatusCode::UNAUTHORIZED => {
                return Err(Attempt::Failed(EvaluationError::Unavailable(
                    "invalid API key".to_string(),
                )))
            }
            StatusCode::TOO_MANY_REQUESTS => {
                return Err(Attempt::Failed(EvaluationError::Unavailable(
                    "API rate limit exceeded".to_string(),
                )))
            }
            status if !status.is_success() => {
                return Err(Attempt::Failed(EvaluationError::Unavailable(format!(
                    "HTTP error: {}",
                    status
                ))))
            }
            _ => {}
        }

        let data: ChatResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                Attempt::TimedOut
            } else {
                Attempt::Failed(EvaluationError::InvalidResponse(e.to_string()))
            }
        })?;

        data.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| {
                Attempt::Failed(EvaluationError::InvalidResponse(
                    "response has no choices".to_string(),
                ))
            })
    }
}

#[async_trait::async_trait]
impl ClarityEvaluator for OpenAiEvaluator {
    async fn evaluate(&self, transcript: &str) -> Result<ClarityScores, EvaluationError> {
        check_transcript(transcript)?;

        let mut attempt = 0;
        loop {
            debug!("Calling {} (attempt {})", self.api_url, attempt + 1);

            match self.request(transcript).await {
                Ok(content) => return parse_scores(&content),
                Err(Attempt::TimedOut) if attempt < self.max_retries => {
                    let backoff = Duration::from_secs(1 << attempt.min(6));
                    warn!(
                        "Evaluator timed out, retrying in {:?} ({}/{})",
                        backoff,
                        attempt + 1,
                        self.max_retries
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(Attempt::TimedOut) => {
                    return Err(EvaluationError::Unavailable(
                        "API timeout after retries".to_string(),
                    ))
                }
                Err(Attempt::Failed(e)) => return Err(e),
            }
        }
    }

    fn name(&self) -> &str {
        "openai"
    }
}
