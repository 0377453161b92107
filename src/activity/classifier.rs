use crate::log::ActivityState;
use regex::Regex;
use std::sync::OnceLock;

/// Editors and IDEs, matched as whole words
const EDITOR_PATTERN: &str = r"(?i)\b(code|vscode|visual studio|pycharm|intellij|clion|goland|webstorm|rustrover|sublime|vim|nvim|neovim|emacs|zed|xcode|eclipse|jupyter|colab)\b";

/// Source file names anywhere in the title
///
/// Also matches library names such as "Node.js", so it is only consulted once the
/// research signatures have missed.
const SOURCE_FILE_PATTERN: &str = r"(?i)\.(py|rs|js|jsx|ts|tsx|go|java|kt|c|cc|cpp|h|hpp|cs|rb|swift|scala|php|sql|ipynb)\b";

/// Browsers, search engines and reference sites
const RESEARCH_PATTERN: &str = r"(?i)\b(chrome|chromium|firefox|edge|safari|opera|brave|google|bing|duckduckgo|stack overflow|stackoverflow|documentation|docs|mdn|wikipedia|gpt|chatgpt|claude)\b";

fn editor_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(EDITOR_PATTERN).expect("editor pattern is valid"))
}

fn source_file_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(SOURCE_FILE_PATTERN).expect("source file pattern is valid"))
}

fn research_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(RESEARCH_PATTERN).expect("research pattern is valid"))
}

/// Map a window title to an activity state
///
/// Editor signatures win over browser signatures, so "main.py - Google Colab" counts as
/// coding. A bare file extension only counts when no browser or reference site is in
/// the title. Anything unrecognised, including an empty title, is IDLE.
pub fn classify(window_title: &str) -> ActivityState {
    let title = window_title.trim();
    if title.is_empty() {
        return ActivityState::Idle;
    }

    if editor_re().is_match(title) {
        ActivityState::Coding
    } else if research_re().is_match(title) {
        ActivityState::Researching
    } else if source_file_re().is_match(title) {
        ActivityState::Coding
    } else {
        ActivityState::Idle
    }
}

/// Remembers the last emitted state and reports only transitions
#[derive(Debug, Default)]
pub struct StateTracker {
    last: Option<ActivityState>,
}

impl StateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify a title; `Some` only when the state differs from the last emitted one
    pub fn observe(&mut self, window_title: &str) -> Option<ActivityState> {
        let state = classify(window_title);
        if self.last == Some(state) {
            return None;
        }
        self.last = Some(state);
        Some(state)
    }

    pub fn last(&self) -> Option<ActivityState> {
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_editor_titles_are_coding() {
        assert_eq!(classify("main.py - Visual Studio Code"), ActivityState::Coding);
        assert_eq!(classify("lib.rs"), ActivityState::Coding);
        assert_eq!(classify("NVIM"), ActivityState::Coding);
        assert_eq!(classify("PyCharm"), ActivityState::Coding);
    }

    #[test]
    fn test_browser_titles_are_researching() {
        assert_eq!(classify("Mock Window - Google Chrome"), ActivityState::Researching);
        assert_eq!(
            classify("rust - How to borrow - Stack Overflow - Mozilla Firefox"),
            ActivityState::Researching
        );
    }

    #[test]
    fn test_library_names_in_browser_are_researching() {
        assert_eq!(classify("Node.js documentation - Google Chrome"), ActivityState::Researching);
        assert_eq!(classify("Next.js - Mozilla Firefox"), ActivityState::Researching);
        assert_eq!(classify("main.py - Google Colab"), ActivityState::Coding);
        assert_eq!(classify("App.tsx - Zed"), ActivityState::Coding);
    }

    #[test]
    fn test_code_word_needs_word_boundary() {
        assert_eq!(classify("How to decode base64 - Google Search"), ActivityState::Researching);
    }

    #[test]
    fn test_unknown_and_empty_are_idle() {
        assert_eq!(classify(""), ActivityState::Idle);
        assert_eq!(classify("   "), ActivityState::Idle);
        assert_eq!(classify("Spotify Premium"), ActivityState::Idle);
    }

    #[test]
    fn test_tracker_suppresses_repeats() {
        let mut tracker = StateTracker::new();

        assert_eq!(tracker.observe("main.rs - vim"), Some(ActivityState::Coding));
        assert_eq!(tracker.observe("lib.rs - vim"), None);
        assert_eq!(tracker.observe("Google Chrome"), Some(ActivityState::Researching));
        assert_eq!(tracker.observe("main.rs - vim"), Some(ActivityState::Coding));
        assert_eq!(tracker.last(), Some(ActivityState::Coding));
    }
}
