pub mod client;
pub mod feed;
pub mod messages;

pub use client::NatsClient;
pub use feed::TranscriptFeed;
pub use messages::TranscriptMessage;
