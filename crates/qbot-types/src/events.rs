use serde::{Deserialize, Serialize};

/// A user text message handed from the intake loop to the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub user: String,
    pub channel: String,
    pub text: String,
}

/// Events delivered by the chat platform's real-time connection,
/// decoded into a closed set at the adapter boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum InboundEvent {
    /// A user posted text in a channel the bot can see
    TextMessage {
        user: String,
        channel: String,
        text: String,
    },

    /// The real-time connection changed state
    ConnectionState(ConnectionState),

    /// A user came online or went away
    PresenceChange { user: String, presence: String },

    /// Round-trip time of the last ping
    LatencyReport { latency_ms: u64 },

    /// The platform reported an error on the connection
    ProtocolError { code: i64, message: String },

    /// The platform rejected our credentials. Not recoverable.
    InvalidAuth { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state")]
pub enum ConnectionState {
    Connecting { attempt: u32 },
    Connected {
        team: String,
        bot_user: String,
        connection_count: u32,
    },
    Disconnected { reason: String },
}

impl InboundEvent {
    /// Returns the queued message form if this is a text message.
    pub fn into_message(self) -> Option<Message> {
        match self {
            Self::TextMessage { user, channel, text } => Some(Message { user, channel, text }),
            _ => None,
        }
    }
}
