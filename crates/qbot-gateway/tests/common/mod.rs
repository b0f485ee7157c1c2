//! Fakes for the chat platform collaborators.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use qbot_db::{Database, PoolConfig};
use qbot_gateway::{AppContext, AppState, ChatError, ProfileLookup, ReplySink};
use qbot_types::Profile;
use tempfile::TempDir;

#[derive(Default)]
pub struct FakeProfiles {
    failing: HashSet<String>,
    calls: AtomicUsize,
}

impl FakeProfiles {
    pub fn failing_for(users: &[&str]) -> Self {
        Self {
            failing: users.iter().map(|u| u.to_string()).collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProfileLookup for FakeProfiles {
    async fn get_profile(&self, user_id: &str) -> Result<Profile, ChatError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(user_id) {
            return Err(ChatError::ProfileLookup {
                user: user_id.to_string(),
                reason: "user_not_found".to_string(),
            });
        }
        Ok(Profile {
            user_id: user_id.to_string(),
            real_name: format!("Name {user_id}"),
            real_name_normalized: format!("Name {user_id}"),
            title: "Tester".to_string(),
            avatar_url: format!("https://avatars.example.com/{user_id}.png"),
        })
    }
}

/// Records every reply in send order.
#[derive(Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingSink {
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    /// Wait until at least `n` replies were sent, then return them as (channel, text).
    pub async fn wait_for(&self, n: usize) -> Vec<(String, String)> {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let sent = self.sent();
                if sent.len() >= n {
                    return sent;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("expected {n} replies, got {:?}", self.sent()))
    }
}

#[async_trait]
impl ReplySink for RecordingSink {
    async fn send(&self, text: &str, channel: &str) -> Result<(), ChatError> {
        self.sent
            .lock()
            .unwrap()
            .push((channel.to_string(), text.to_string()));
        Ok(())
    }
}

pub struct Harness {
    pub ctx: AppState,
    pub db: Database,
    pub profiles: Arc<FakeProfiles>,
    pub sink: Arc<RecordingSink>,
    _dir: TempDir,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_profiles(FakeProfiles::default())
    }

    pub fn with_profiles(profiles: FakeProfiles) -> Self {
        let dir = TempDir::new().unwrap();
        let config = PoolConfig {
            max_open: 8,
            max_idle: 2,
            max_lifetime: Duration::from_secs(30),
        };
        let db = Database::open(&dir.path().join("qbot.db"), &config).unwrap();
        let profiles = Arc::new(profiles);
        let sink = Arc::new(RecordingSink::default());
        let ctx = Arc::new(AppContext::new(db.clone(), profiles.clone(), sink.clone()));
        Self {
            ctx,
            db,
            profiles,
            sink,
            _dir: dir,
        }
    }
}

pub fn msg(user: &str, text: &str) -> qbot_types::Message {
    qbot_types::Message {
        user: user.to_string(),
        channel: "C0QNA".to_string(),
        text: text.to_string(),
    }
}
