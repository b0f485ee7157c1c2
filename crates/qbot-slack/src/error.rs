#[derive(Debug, thiserror::Error)]
pub enum SlackError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("slack api error: {0}")]
    Api(String),

    #[error("unexpected response: {0}")]
    Json(#[from] serde_json::Error),
}

impl SlackError {
    /// Errors that retrying with the same token cannot fix.
    pub fn is_auth_failure(&self) -> bool {
        match self {
            Self::Api(code) => matches!(
                code.as_str(),
                "invalid_auth" | "not_authed" | "account_inactive" | "token_revoked" | "token_expired"
            ),
            _ => false,
        }
    }
}
