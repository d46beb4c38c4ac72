use std::sync::Arc;

use queuebot_core::brain::{Brain, ParameterStore};
use queuebot_core::event::Event;
use secrecy::SecretString;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::chat::{ChatApi, ChatError, ChatResponse};
use crate::commands::{extract_command, CommandRegistry};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Text was empty or lacked the command prefix.
    NotACommand,
    NoSuchCommand { keyword: String },
    Dispatched { keyword: String },
    HandlerFailed { keyword: String, error: String },
}

impl DispatchOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::NotACommand => "not_a_command",
            Self::NoSuchCommand { .. } => "no_such_command",
            Self::Dispatched { .. } => "dispatched",
            Self::HandlerFailed { .. } => "handler_failed",
        }
    }
}

/// Routes chat events to command apps and sends their replies.
///
/// The chat access token is read lazily from the parameter store, cached, and
/// dropped again when the platform answers `invalid_auth`.
pub struct Robot {
    access_token_key: String,
    registry: CommandRegistry,
    store: Arc<dyn ParameterStore>,
    brain: Brain,
    chat: Arc<dyn ChatApi>,
    token: RwLock<Option<SecretString>>,
}

impl Robot {
    pub fn new(
        access_token_key: impl Into<String>,
        registry: CommandRegistry,
        store: Arc<dyn ParameterStore>,
        chat: Arc<dyn ChatApi>,
    ) -> Self {
        Self {
            access_token_key: access_token_key.into(),
            registry,
            brain: Brain::new(Arc::clone(&store)),
            store,
            chat,
            token: RwLock::new(None),
        }
    }

    pub fn brain(&self) -> &Brain {
        &self.brain
    }

    pub fn usage(&self) -> &[String] {
        self.registry.usage()
    }

    pub fn prefix(&self) -> &str {
        self.registry.prefix()
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Cached token, fetched with decryption on first use. Fetch failures are
    /// logged and yield `None`.
    pub async fn access_token(&self) -> Option<SecretString> {
        if let Some(token) = self.token.read().await.as_ref() {
            return Some(token.clone());
        }

        let mut slot = self.token.write().await;
        if let Some(token) = slot.as_ref() {
            return Some(token.clone());
        }

        match self.store.get_parameter(&self.access_token_key, true).await {
            Ok(Some(parameter)) => {
                let token = SecretString::from(parameter.value);
                *slot = Some(token.clone());
                debug!(
                    event_name = "robot.token.fetched",
                    parameter = %self.access_token_key,
                    "cached chat access token"
                );
                Some(token)
            }
            Ok(None) => {
                warn!(
                    event_name = "robot.token.missing",
                    parameter = %self.access_token_key,
                    "chat access token parameter does not exist"
                );
                None
            }
            Err(error) => {
                warn!(
                    event_name = "robot.token.fetch_failed",
                    parameter = %self.access_token_key,
                    error = %error,
                    "could not fetch chat access token"
                );
                None
            }
        }
    }

    async fn invalidate_token(&self) {
        *self.token.write().await = None;
    }

    /// Posts to the chat API, refreshing the token and retrying exactly once
    /// when the first attempt reports `invalid_auth`.
    pub async fn post_message(&self, channel: &str, text: &str) -> Result<ChatResponse, ChatError> {
        let token = self.access_token().await;
        let response = self.chat.post_message(token.as_ref(), channel, text).await?;
        if !response.is_invalid_auth() {
            return Ok(response);
        }

        info!(
            event_name = "robot.token.invalid_auth",
            channel = %channel,
            "chat API rejected the cached token; refreshing and retrying once"
        );
        self.invalidate_token().await;
        let token = self.access_token().await;
        self.chat.post_message(token.as_ref(), channel, text).await
    }

    /// Never fails: handler errors are logged and reported in the outcome.
    pub async fn handle_event(&self, event: &Event) -> DispatchOutcome {
        let Some((keyword, payload)) = extract_command(self.prefix(), &event.text) else {
            debug!(event_name = "robot.dispatch.ignored", channel = %event.channel, "not a command");
            return DispatchOutcome::NotACommand;
        };

        let Some(app) = self.registry.lookup(&keyword) else {
            debug!(
                event_name = "robot.dispatch.unknown",
                channel = %event.channel,
                keyword = %keyword,
                "no app registered for keyword"
            );
            return DispatchOutcome::NoSuchCommand { keyword };
        };

        match app.run(self, &event.channel, &event.user, &payload).await {
            Ok(()) => {
                info!(
                    event_name = "robot.dispatch.completed",
                    channel = %event.channel,
                    keyword = %keyword,
                    app = app.name(),
                    "command handled"
                );
                DispatchOutcome::Dispatched { keyword }
            }
            Err(handler_error) => {
                error!(
                    event_name = "robot.dispatch.failed",
                    channel = %event.channel,
                    keyword = %keyword,
                    app = app.name(),
                    error = %handler_error,
                    "command handler failed"
                );
                DispatchOutcome::HandlerFailed { keyword, error: handler_error.to_string() }
            }
        }
    }
}
