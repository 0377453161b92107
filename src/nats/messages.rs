use serde::{Deserialize, Serialize};

/// Transcript message received from the STT service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptMessage {
    /// Session the speech belongs to; absent when the STT service is session-agnostic
    #[serde(default)]
    pub session_id: Option<String>,
    pub text: String,
    #[serde(default)]
    pub partial: bool,
    #[serde(default)]
    pub timestamp: Option<String>, // RFC3339 timestamp
    #[serde(default)]
    pub confidence: Option<f32>,
}

impl TranscriptMessage {
    /// Whether this message should feed the session `active_session`
    ///
    /// Partial (interim) results are skipped; only final text is evaluated.
    pub fn is_for(&self, active_session: &str) -> bool {
        if self.partial || self.text.trim().is_empty() {
            return false;
        }
        match self.session_id.as_deref() {
            Some(id) => id == active_session,
            None => true,
        }
    }
}
