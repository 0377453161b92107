use anyhow::{Context, Result};
use serde::Deserialize;

/// Environment variable consulted when no API key is configured
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub session: SessionSettings,
    pub evaluator: EvaluatorConfig,
    pub nats: NatsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionSettings {
    /// Directory for `session_log.json`; unset keeps the log in memory
    pub log_dir: Option<String>,
    pub pass_threshold: f64,
    pub research_weight: f64,
    /// How long finalization waits for producers to acknowledge stop
    pub stop_timeout_ms: u64,
    /// Upper bound for the end-of-session clarity analysis
    pub final_analysis_timeout_secs: u64,
    /// Bound of the producer queues
    pub channel_capacity: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvaluatorMode {
    /// Deterministic local heuristic
    Fake,
    /// OpenAI-compatible chat completions endpoint
    Openai,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EvaluatorConfig {
    pub mode: EvaluatorMode,
    pub api_url: String,
    pub model: String,
    pub temperature: f32,
    pub timeout_secs: u64,
    pub max_retries: u32,
    /// Transcript chunks with fewer words are not evaluated
    pub min_words: usize,
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NatsConfig {
    pub enabled: bool,
    pub url: String,
    pub subject: String,
}

impl Config {
    /// Load configuration from `path` (extension optional, file optional),
    /// overridden by `GLASSBOX__SECTION__KEY` environment variables
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("service.name", "glassbox")?
            .set_default("service.http.bind", "127.0.0.1")?
            .set_default("service.http.port", 8765_i64)?
            .set_default("session.pass_threshold", 60.0)?
            .set_default("session.research_weight", 0.5)?
            .set_default("session.stop_timeout_ms", 5000_i64)?
            .set_default("session.final_analysis_timeout_secs", 60_i64)?
            .set_default("session.channel_capacity", 64_i64)?
            .set_default("evaluator.mode", "fake")?
            .set_default("evaluator.api_url", "https://api.openai.com/v1/chat/completions")?
            .set_default("evaluator.model", "gpt-3.5-turbo")?
            .set_default("evaluator.temperature", 0.1)?
            .set_default("evaluator.timeout_secs", 10_i64)?
            .set_default("evaluator.max_retries", 3_i64)?
            .set_default("evaluator.min_words", 2_i64)?
            .set_default("nats.enabled", false)?
            .set_default("nats.url", "nats://localhost:4222")?
            .set_default("nats.subject", "stt.text.final")?
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("GLASSBOX")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to load config from {}", path))?;

        let mut cfg: Self = settings
            .try_deserialize()
            .context("Invalid configuration")?;

        if cfg.evaluator.api_key.is_none() {
            cfg.evaluator.api_key = std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty());
        }

        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent");

        let cfg = Config::load(path.to_str().unwrap()).unwrap();
        assert_eq!(cfg.service.name, "glassbox");
        assert_eq!(cfg.session.pass_threshold, 60.0);
        assert_eq!(cfg.session.research_weight, 0.5);
        assert_eq!(cfg.evaluator.mode, EvaluatorMode::Fake);
        assert!(cfg.session.log_dir.is_none());
        assert!(!cfg.nats.enabled);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("glassbox.toml");
        fs::write(
            &path,
            "[session]\nlog_dir = \"data\"\npass_threshold = 70.0\n\n[evaluator]\nmode = \"openai\"\n",
        )
        .unwrap();

        let cfg = Config::load(path.to_str().unwrap()).unwrap();
        assert_eq!(cfg.session.log_dir.as_deref(), Some("data"));
        assert_eq!(cfg.session.pass_threshold, 70.0);
        assert_eq!(cfg.session.stop_timeout_ms, 5000);
        assert_eq!(cfg.evaluator.mode, EvaluatorMode::Openai);
    }
}
