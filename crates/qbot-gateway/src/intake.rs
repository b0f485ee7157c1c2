use tokio::sync::mpsc;
use tracing::{error, info, trace, warn};

use qbot_types::{ConnectionState, InboundEvent, Message};

use crate::error::IntakeError;
use crate::ports::EventSource;

/// Capacity of the queue between intake and dispatcher.
pub const DEFAULT_QUEUE_CAPACITY: usize = 500;

/// Bounded FIFO between the intake and the dispatcher.
/// Sends wait while the queue is full, so nothing is dropped or reordered.
pub fn message_queue(capacity: usize) -> (mpsc::Sender<Message>, mpsc::Receiver<Message>) {
    mpsc::channel(capacity)
}

/// Demultiplex platform events until the source closes or rejects our credentials.
///
/// Text messages are queued for the dispatcher; everything else is only logged.
pub async fn run_intake<S>(source: &mut S, queue: mpsc::Sender<Message>) -> Result<(), IntakeError>
where
    S: EventSource + ?Sized,
{
    info!("Message intake started");

    while let Some(event) = source.next_event().await {
        match event {
            InboundEvent::TextMessage { user, channel, text } => {
                if user.is_empty() {
                    trace!("Dropping message without an author in {}", channel);
                    continue;
                }
                if queue.send(Message { user, channel, text }).await.is_err() {
                    warn!("Message queue closed, stopping intake");
                    return Ok(());
                }
            }

            InboundEvent::ConnectionState(state) => match state {
                ConnectionState::Connecting { attempt } => {
                    info!("Connecting to chat platform (attempt {})", attempt);
                }
                ConnectionState::Connected {
                    team,
                    bot_user,
                    connection_count,
                } => {
                    info!("Connected to {} as {}", team, bot_user);
                    info!("Connection counter: {}", connection_count);
                }
                ConnectionState::Disconnected { reason } => {
                    warn!("Disconnected from chat platform: {}", reason);
                }
            },

            InboundEvent::PresenceChange { user, presence } => {
                info!("Presence change: {} is {}", user, presence);
            }

            InboundEvent::LatencyReport { latency_ms } => {
                trace!("Current latency: {}ms", latency_ms);
            }

            InboundEvent::ProtocolError { code, message } => {
                error!("RTM error {}: {}", code, message);
            }

            InboundEvent::InvalidAuth { reason } => {
                warn!("Invalid credentials: {}", reason);
                return Err(IntakeError::InvalidAuth(reason));
            }
        }
    }

    info!("Event source closed, stopping intake");
    Ok(())
}
