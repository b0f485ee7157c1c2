use async_trait::async_trait;
use tokio::sync::mpsc;

use qbot_types::{InboundEvent, Profile};

use crate::error::ChatError;

/// Long-lived stream of events from the chat platform.
/// `None` means the connection is gone for good.
#[async_trait]
pub trait EventSource: Send {
    async fn next_event(&mut self) -> Option<InboundEvent>;
}

#[async_trait]
impl EventSource for mpsc::Receiver<InboundEvent> {
    async fn next_event(&mut self) -> Option<InboundEvent> {
        self.recv().await
    }
}

#[async_trait]
pub trait ProfileLookup: Send + Sync {
    async fn get_profile(&self, user_id: &str) -> Result<Profile, ChatError>;
}

/// Outbound message primitive. At most one delivery per call.
#[async_trait]
pub trait ReplySink: Send + Sync {
    async fn send(&self, text: &str, channel: &str) -> Result<(), ChatError>;
}
