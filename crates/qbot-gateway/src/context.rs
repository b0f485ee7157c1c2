use std::sync::Arc;

use tracing::warn;

use qbot_db::Database;

use crate::error::DispatchError;
use crate::ports::{ProfileLookup, ReplySink};

pub type AppState = Arc<AppContext>;

/// Everything the intake and dispatcher tasks need, built once at startup.
pub struct AppContext {
    pub db: Database,
    pub profiles: Arc<dyn ProfileLookup>,
    pub replies: Arc<dyn ReplySink>,
    /// N for the "last N" commands.
    pub list_limit: u32,
}

impl AppContext {
    pub fn new(db: Database, profiles: Arc<dyn ProfileLookup>, replies: Arc<dyn ReplySink>) -> Self {
        Self {
            db,
            profiles,
            replies,
            list_limit: 10,
        }
    }

    pub fn with_list_limit(mut self, limit: u32) -> Self {
        self.list_limit = limit;
        self
    }

    /// Run blocking DB work off the async runtime.
    pub async fn with_db<F, T>(&self, f: F) -> Result<T, DispatchError>
    where
        F: FnOnce(&Database) -> qbot_db::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.db.clone();
        let out = tokio::task::spawn_blocking(move || f(&db)).await??;
        Ok(out)
    }

    /// Send a reply. Delivery failures are logged, never retried.
    pub async fn reply(&self, channel: &str, text: &str) {
        if let Err(e) = self.replies.send(text, channel).await {
            warn!("Reply dropped: {}", e);
        }
    }
}
