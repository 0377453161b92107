//! Window activity classification and the activity producer

mod classifier;
mod monitor;

pub use classifier::{classify, StateTracker};
pub use monitor::ActivityMonitor;
