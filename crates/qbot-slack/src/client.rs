use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;

use qbot_gateway::{ChatError, ProfileLookup, ReplySink};
use qbot_types::Profile;

use crate::error::SlackError;

const API_BASE: &str = "https://slack.com/api";

/// Slack Web API client. Cheap to clone.
#[derive(Clone)]
pub struct SlackClient {
    http: reqwest::Client,
    token: String,
    base_url: String,
}

/// Result of `rtm.connect`.
#[derive(Debug, Clone, Deserialize)]
pub struct RtmSession {
    pub url: String,
    #[serde(rename = "self")]
    pub bot: BotIdentity,
    pub team: TeamIdentity,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BotIdentity {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TeamIdentity {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct UsersInfo {
    user: SlackUser,
}

#[derive(Debug, Deserialize)]
struct SlackUser {
    id: String,
    #[serde(default)]
    profile: SlackProfile,
}

#[derive(Debug, Default, Deserialize)]
struct SlackProfile {
    #[serde(default)]
    real_name: String,
    #[serde(default)]
    real_name_normalized: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    image_32: String,
}

impl From<SlackUser> for Profile {
    fn from(user: SlackUser) -> Self {
        Profile {
            user_id: user.id,
            real_name: user.profile.real_name,
            real_name_normalized: user.profile.real_name_normalized,
            title: user.profile.title,
            avatar_url: user.profile.image_32,
        }
    }
}

impl SlackClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            token: token.into(),
            base_url: API_BASE.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub async fn rtm_connect(&self) -> Result<RtmSession, SlackError> {
        let req = self.http.post(format!("{}/rtm.connect", self.base_url));
        self.call(req).await
    }

    pub async fn users_info(&self, user_id: &str) -> Result<Profile, SlackError> {
        let req = self
            .http
            .get(format!("{}/users.info", self.base_url))
            .query(&[("user", user_id)]);
        let info: UsersInfo = self.call(req).await?;
        Ok(info.user.into())
    }

    pub async fn post_message(&self, channel: &str, text: &str) -> Result<(), SlackError> {
        let req = self
            .http
            .post(format!("{}/chat.postMessage", self.base_url))
            .json(&json!({ "channel": channel, "text": text }));
        let _: Value = self.call(req).await?;
        debug!("Posted {} bytes to {}", text.len(), channel);
        Ok(())
    }

    async fn call<T: DeserializeOwned>(&self, req: reqwest::RequestBuilder) -> Result<T, SlackError> {
        let body: Value = req
            .bearer_auth(&self.token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        parse_envelope(body)
    }
}

/// Every Web API response carries `ok`; failures name the reason in `error`.
fn parse_envelope<T: DeserializeOwned>(body: Value) -> Result<T, SlackError> {
    if body.get("ok").and_then(Value::as_bool) != Some(true) {
        let code = body
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("unknown_error");
        return Err(SlackError::Api(code.to_string()));
    }
    Ok(serde_json::from_value(body)?)
}

#[async_trait]
impl ProfileLookup for SlackClient {
    async fn get_profile(&self, user_id: &str) -> Result<Profile, ChatError> {
        self.users_info(user_id)
            .await
            .map_err(|e| ChatError::ProfileLookup {
                user: user_id.to_string(),
                reason: e.to_string(),
            })
    }
}

#[async_trait]
impl ReplySink for SlackClient {
    async fn send(&self, text: &str, channel: &str) -> Result<(), ChatError> {
        self.post_message(channel, text)
            .await
            .map_err(|e| ChatError::Send {
                channel: channel.to_string(),
                reason: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn users_info_maps_to_profile() {
        let body = json!({
            "ok": true,
            "user": {
                "id": "W012A3CDE",
                "name": "spengler",
                "profile": {
                    "real_name": "Egon Spengler",
                    "real_name_normalized": "Egon Spengler",
                    "title": "Parapsychologist",
                    "image_32": "https://a.slack-edge.com/egon_32.png"
                }
            }
        });
        let info: UsersInfo = parse_envelope(body).unwrap();
        let profile = Profile::from(info.user);
        assert_eq!(profile.user_id, "W012A3CDE");
        assert_eq!(profile.real_name, "Egon Spengler");
        assert_eq!(profile.title, "Parapsychologist");
        assert_eq!(profile.avatar_url, "https://a.slack-edge.com/egon_32.png");
    }

    #[test]
    fn missing_profile_fields_default_to_empty() {
        let body = json!({ "ok": true, "user": { "id": "U1" } });
        let info: UsersInfo = parse_envelope(body).unwrap();
        let profile = Profile::from(info.user);
        assert_eq!(profile, Profile::unresolved("U1"));
    }

    #[test]
    fn api_error_is_surfaced() {
        let err = parse_envelope::<Value>(json!({ "ok": false, "error": "invalid_auth" })).unwrap_err();
        assert!(err.is_auth_failure());

        let err = parse_envelope::<Value>(json!({})).unwrap_err();
        assert!(matches!(err, SlackError::Api(ref code) if code == "unknown_error"));
    }

    #[test]
    fn rtm_connect_response_decodes() {
        let body = json!({
            "ok": true,
            "url": "wss://wss.slack.com/websocket/abc",
            "team": { "id": "T1", "name": "Ghostbusters", "domain": "gb" },
            "self": { "id": "U0BOT", "name": "qbot" }
        });
        let session: RtmSession = parse_envelope(body).unwrap();
        assert_eq!(session.bot.id, "U0BOT");
        assert_eq!(session.team.name, "Ghostbusters");
    }
}
