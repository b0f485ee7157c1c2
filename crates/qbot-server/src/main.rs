mod config;

use std::sync::Arc;

use tracing::{error, info};

use qbot_db::Database;
use qbot_gateway::{AppContext, AppState, message_queue, run_dispatcher, run_intake};
use qbot_slack::{SlackClient, spawn_event_stream};

use crate::config::Config;

/// Buffer between the RTM socket reader and the intake loop.
const EVENT_BUFFER: usize = 64;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    let config = Config::from_env()?;

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter().into()),
        )
        .init();

    // Init database
    let db = Database::open(&config.db_path, &config.pool)?;

    // Shared state
    let slack = Arc::new(SlackClient::new(config.slack_token.clone()));
    let ctx: AppState = Arc::new(
        AppContext::new(db, slack.clone(), slack.clone()).with_list_limit(config.list_limit),
    );

    let (queue_tx, queue_rx) = message_queue(config.queue_capacity);
    let mut events = spawn_event_stream(SlackClient::clone(&slack), EVENT_BUFFER);

    let dispatcher = tokio::spawn(run_dispatcher(ctx, queue_rx));
    info!("qBot started (queue capacity {})", config.queue_capacity);

    // Intake owns the producer side; once it returns the dispatcher drains and stops.
    let intake = run_intake(&mut events, queue_tx).await;
    if let Err(e) = &intake {
        error!("Intake stopped: {}", e);
    }

    dispatcher.await?;
    intake?;
    Ok(())
}
