//! Alert channel.

use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification transport failed: {0}")]
    Transport(String),

    #[error("notification rejected: {0}")]
    Rejected(String),
}

/// Fire-and-forget message sink. Callers log failures and carry on.
pub trait Notifier {
    fn send_message(&self, channel: &str, text: &str) -> Result<(), NotifyError>;
}

/// Notifier that only writes to the log. Used for dry runs and when no
/// token is configured.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send_message(&self, channel: &str, text: &str) -> Result<(), NotifyError> {
        tracing::warn!(channel, "{text}");
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct SlackResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

const SLACK_POST_MESSAGE: &str = "https://slack.com/api/chat.postMessage";

/// Slack `chat.postMessage` with a bot token.
pub struct SlackNotifier {
    client: reqwest::blocking::Client,
    token: String,
}

impl SlackNotifier {
    pub fn new(token: impl Into<String>) -> Result<Self, NotifyError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| NotifyError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            token: token.into(),
        })
    }
}

impl Notifier for SlackNotifier {
    fn send_message(&self, channel: &str, text: &str) -> Result<(), NotifyError> {
        let resp = self
            .client
            .post(SLACK_POST_MESSAGE)
            .bearer_auth(&self.token)
            .json(&serde_json::json!({ "channel": channel, "text": text }))
            .send()
            .map_err(|e| NotifyError::Transport(e.without_url().to_string()))?;

        if !resp.status().is_success() {
            return Err(NotifyError::Rejected(format!("HTTP {}", resp.status())));
        }
        let body: SlackResponse = resp
            .json()
            .map_err(|e| NotifyError::Transport(format!("unreadable slack response: {e}")))?;
        if !body.ok {
            return Err(NotifyError::Rejected(
                body.error.unwrap_or_else(|| "unknown error".into()),
            ));
        }
        Ok(())
    }
}
