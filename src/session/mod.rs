//! Audited session lifecycle
//!
//! This module provides the `SessionManager` that manages:
//! - Session creation (one open session at a time)
//! - The activity and clarity producers feeding the writer gate
//! - Cooperative stop with a bounded wait for producers
//! - Final analysis, score reduction and finalization

mod config;
mod manager;
mod stats;

pub use config::SessionConfig;
pub use manager::{SessionHandle, SessionManager};
pub use stats::{SessionReport, SessionStats};
