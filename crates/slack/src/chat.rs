use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

pub const INVALID_AUTH: &str = "invalid_auth";

/// Body of a `chat.postMessage` reply. Slack answers HTTP 200 even for API
/// errors, so `ok`/`error` are the only reliable outcome signal.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub ts: Option<String>,
}

impl ChatResponse {
    pub fn is_invalid_auth(&self) -> bool {
        self.error.as_deref() == Some(INVALID_AUTH)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ChatError {
    #[error("chat client could not be built: {0}")]
    Client(String),
    #[error("chat request failed: {0}")]
    Transport(String),
    #[error("chat response was not valid JSON: {0}")]
    Decode(String),
}

#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Posts `text` to `channel`. A `None` token omits the form field and lets
    /// the platform reject the call.
    async fn post_message(
        &self,
        token: Option<&SecretString>,
        channel: &str,
        text: &str,
    ) -> Result<ChatResponse, ChatError>;
}

pub struct SlackWebClient {
    client: Client,
    post_message_url: String,
}

impl SlackWebClient {
    pub fn new(post_message_url: impl Into<String>, timeout: Duration) -> Result<Self, ChatError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| ChatError::Client(error.to_string()))?;
        Ok(Self { client, post_message_url: post_message_url.into() })
    }
}

#[async_trait]
impl ChatApi for SlackWebClient {
    async fn post_message(
        &self,
        token: Option<&SecretString>,
        channel: &str,
        text: &str,
    ) -> Result<ChatResponse, ChatError> {
        let mut form: Vec<(&str, &str)> = Vec::with_capacity(3);
        if let Some(token) = token {
            form.push(("token", token.expose_secret()));
        }
        form.push(("channel", channel));
        form.push(("text", text));

        let response = self
            .client
            .post(&self.post_message_url)
            .form(&form)
            .send()
            .await
            .map_err(|error| ChatError::Transport(error.to_string()))?;

        response.json::<ChatResponse>().await.map_err(|error| ChatError::Decode(error.to_string()))
    }
}
