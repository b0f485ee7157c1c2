use std::collections::HashMap;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, info, trace, warn};

use qbot_types::{ConnectionState, InboundEvent};

use crate::client::{RtmSession, SlackClient};

/// Ping interval on the RTM socket. Each pong yields a latency report.
const PING_INTERVAL: Duration = Duration::from_secs(30);

const MAX_BACKOFF: Duration = Duration::from_secs(60);

const LOGGED_FRAME_CHARS: usize = 200;

/// Raw RTM frames we care about. Everything else decodes to `Other`.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum RtmFrame {
    Hello,
    Message {
        #[serde(default)]
        user: Option<String>,
        #[serde(default)]
        channel: Option<String>,
        #[serde(default)]
        text: Option<String>,
        #[serde(default)]
        subtype: Option<String>,
        #[serde(default)]
        bot_id: Option<String>,
    },
    PresenceChange {
        user: String,
        presence: String,
    },
    Error {
        error: RtmErrorBody,
    },
    Pong {
        reply_to: u64,
    },
    Goodbye,
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct RtmErrorBody {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    msg: String,
}

/// Turns RTM frames from one session into inbound events.
struct FrameDecoder {
    team: String,
    bot_user_id: String,
    bot_name: String,
    connection_count: u32,
    pending_pings: HashMap<u64, Instant>,
}

impl FrameDecoder {
    fn new(session: &RtmSession, connection_count: u32) -> Self {
        Self {
            team: session.team.name.clone(),
            bot_user_id: session.bot.id.clone(),
            bot_name: session.bot.name.clone(),
            connection_count,
            pending_pings: HashMap::new(),
        }
    }

    fn ping_sent(&mut self, id: u64, at: Instant) {
        self.pending_pings.insert(id, at);
    }

    fn decode(&mut self, raw: &str) -> Option<InboundEvent> {
        let frame = match serde_json::from_str::<RtmFrame>(raw) {
            Ok(frame) => frame,
            Err(e) => {
                trace!(
                    "Skipping undecodable RTM frame: {} -- raw: {}",
                    e,
                    truncate_for_log(raw, LOGGED_FRAME_CHARS)
                );
                return None;
            }
        };

        match frame {
            RtmFrame::Hello => Some(InboundEvent::ConnectionState(ConnectionState::Connected {
                team: self.team.clone(),
                bot_user: self.bot_name.clone(),
                connection_count: self.connection_count,
            })),

            RtmFrame::Message {
                user,
                channel,
                text,
                subtype,
                bot_id,
            } => {
                // Edits, joins and bot posts carry a subtype or bot_id; only plain user text counts
                if subtype.is_some() || bot_id.is_some() {
                    return None;
                }
                let user = user?;
                if user == self.bot_user_id {
                    return None;
                }
                Some(InboundEvent::TextMessage {
                    user,
                    channel: channel?,
                    text: text.unwrap_or_default(),
                })
            }

            RtmFrame::PresenceChange { user, presence } => {
                Some(InboundEvent::PresenceChange { user, presence })
            }

            RtmFrame::Error { error } => Some(InboundEvent::ProtocolError {
                code: error.code,
                message: error.msg,
            }),

            RtmFrame::Pong { reply_to } => {
                let sent_at = self.pending_pings.remove(&reply_to)?;
                Some(InboundEvent::LatencyReport {
                    latency_ms: sent_at.elapsed().as_millis() as u64,
                })
            }

            RtmFrame::Goodbye => Some(InboundEvent::ConnectionState(ConnectionState::Disconnected {
                reason: "server said goodbye".to_string(),
            })),

            RtmFrame::Other => None,
        }
    }
}

/// Connect to RTM and keep the session alive, forwarding decoded events.
///
/// Reconnects with backoff on transport failures. Stops after emitting
/// `InvalidAuth`, or once the returned receiver is dropped.
pub fn spawn_event_stream(client: SlackClient, capacity: usize) -> mpsc::Receiver<InboundEvent> {
    let (tx, rx) = mpsc::channel(capacity);
    tokio::spawn(run_event_stream(client, tx));
    rx
}

async fn run_event_stream(client: SlackClient, tx: mpsc::Sender<InboundEvent>) {
    let mut attempt: u32 = 0;
    let mut connections: u32 = 0;

    loop {
        attempt += 1;
        let connecting = InboundEvent::ConnectionState(ConnectionState::Connecting { attempt });
        if tx.send(connecting).await.is_err() {
            return;
        }

        let reason = match client.rtm_connect().await {
            Err(e) if e.is_auth_failure() => {
                let _ = tx.send(InboundEvent::InvalidAuth { reason: e.to_string() }).await;
                return;
            }
            Err(e) => e.to_string(),
            Ok(session) => {
                attempt = 0;
                connections += 1;
                info!("RTM session for {} opened", session.team.name);
                run_session(&session, connections, &tx).await
            }
        };

        if tx.is_closed() {
            return;
        }
        let disconnected = InboundEvent::ConnectionState(ConnectionState::Disconnected { reason });
        if tx.send(disconnected).await.is_err() {
            return;
        }

        tokio::time::sleep(backoff(attempt)).await;
    }
}

/// Pump one websocket session. Returns why it ended.
async fn run_session(session: &RtmSession, connection_count: u32, tx: &mpsc::Sender<InboundEvent>) -> String {
    let (ws, _) = match tokio_tungstenite::connect_async(session.url.as_str()).await {
        Ok(ws) => ws,
        Err(e) => return format!("websocket connect failed: {}", e),
    };
    let (mut sink, mut stream) = ws.split();

    let mut decoder = FrameDecoder::new(session, connection_count);
    let mut heartbeat = tokio::time::interval(PING_INTERVAL);
    heartbeat.tick().await;
    let mut next_ping_id: u64 = 1;

    loop {
        tokio::select! {
            frame = stream.next() => {
                let text = match frame {
                    Some(Ok(WsMessage::Text(text))) => text,
                    Some(Ok(WsMessage::Close(_))) | None => return "connection closed".to_string(),
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => return format!("websocket error: {}", e),
                };

                if let Some(event) = decoder.decode(text.as_str()) {
                    if tx.send(event).await.is_err() {
                        return "event receiver dropped".to_string();
                    }
                }
            }
            _ = heartbeat.tick() => {
                let id = next_ping_id;
                next_ping_id += 1;
                decoder.ping_sent(id, Instant::now());
                let ping = json!({ "id": id, "type": "ping" }).to_string();
                if let Err(e) = sink.send(WsMessage::Text(ping.into())).await {
                    warn!("RTM ping failed: {}", e);
                    return format!("ping failed: {}", e);
                }
                debug!("RTM ping {} sent", id);
            }
        }
    }
}

fn backoff(attempt: u32) -> Duration {
    let secs = 1u64 << attempt.min(6);
    Duration::from_secs(secs).min(MAX_BACKOFF)
}

/// First `max_chars` characters of `raw`, cut on a char boundary.
fn truncate_for_log(raw: &str, max_chars: usize) -> &str {
    raw.char_indices().nth(max_chars).map_or(raw, |(i, _)| &raw[..i])
}
