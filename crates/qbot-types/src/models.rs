use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Profile details resolved from the chat platform for a message author.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: String,
    pub real_name: String,
    pub real_name_normalized: String,
    pub title: String,
    pub avatar_url: String,
}

impl Profile {
    /// Degraded profile used when the lookup fails. Only the platform id is known.
    pub fn unresolved(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            ..Default::default()
        }
    }

    /// Name shown in replies and stored on questions/answers.
    pub fn display_name(&self) -> &str {
        if !self.real_name.is_empty() {
            &self.real_name
        } else if !self.real_name_normalized.is_empty() {
            &self.real_name_normalized
        } else {
            &self.user_id
        }
    }
}

/// A chat platform user. `slack_user` is unique across the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Option<i64>,
    pub slack_user: String,
    pub name: String,
    pub title: String,
    pub avatar: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn from_profile(profile: &Profile) -> Self {
        Self {
            id: None,
            slack_user: profile.user_id.clone(),
            name: profile.real_name_normalized.clone(),
            title: profile.title.clone(),
            avatar: profile.avatar_url.clone(),
            created_at: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: Option<i64>,
    pub question: String,
    pub slack_channel: String,
    pub user_name: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl Question {
    pub fn new(question: impl Into<String>, slack_channel: impl Into<String>, user_name: impl Into<String>) -> Self {
        Self {
            id: None,
            question: question.into(),
            slack_channel: slack_channel.into(),
            user_name: user_name.into(),
            created_at: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub id: Option<i64>,
    pub answer: String,
    pub question_id: i64,
    pub slack_channel: String,
    pub user_name: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl Answer {
    pub fn new(
        answer: impl Into<String>,
        question_id: i64,
        slack_channel: impl Into<String>,
        user_name: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            answer: answer.into(),
            question_id,
            slack_channel: slack_channel.into(),
            user_name: user_name.into(),
            created_at: None,
        }
    }
}
