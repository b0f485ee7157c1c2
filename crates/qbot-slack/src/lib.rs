//! Slack adapter: RTM event stream, profile lookup and message posting.

pub mod client;
pub mod error;
pub mod rtm;

pub use client::SlackClient;
pub use error::SlackError;
pub use rtm::spawn_event_stream;
