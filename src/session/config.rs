use crate::config::Config;
use crate::scoring::ScoringPolicy;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for audited sessions
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Directory for the persisted session log; `None` keeps it in memory
    pub log_dir: Option<PathBuf>,

    /// Threshold and research weight used by the score reducer
    pub policy: ScoringPolicy,

    /// How long finalization waits for producers to stop before sealing anyway
    /// Default: 5 seconds
    pub stop_timeout: Duration,

    /// Upper bound for the final clarity analysis at session end
    /// Default: 60 seconds
    pub final_analysis_timeout: Duration,

    /// Capacity of the producer queues and the writer gate
    pub channel_capacity: usize,

    /// Transcript chunks with fewer words are ignored
    pub min_words: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            log_dir: None,
            policy: ScoringPolicy::default(),
            stop_timeout: Duration::from_secs(5),
            final_analysis_timeout: Duration::from_secs(60),
            channel_capacity: 64,
            min_words: 2,
        }
    }
}

impl SessionConfig {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            log_dir: cfg.session.log_dir.as_ref().map(PathBuf::from),
            policy: ScoringPolicy {
                pass_threshold: cfg.session.pass_threshold,
                research_weight: cfg.session.research_weight,
            },
            stop_timeout: Duration::from_millis(cfg.session.stop_timeout_ms),
            final_analysis_timeout: Duration::from_secs(cfg.session.final_analysis_timeout_secs),
            channel_capacity: cfg.session.channel_capacity,
            min_words: cfg.evaluator.min_words,
        }
    }
}
