use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use queuebot_core::brain::{ParameterStore, ParameterType};
use queuebot_core::memory::InMemoryParameterStore;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::Mutex;

use crate::chat::{ChatApi, ChatError, ChatResponse};
use crate::commands::CommandRegistry;
use crate::robot::Robot;

pub const TOKEN_KEY: &str = "/queuebot/test/access-token";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedPost {
    pub token: Option<String>,
    pub channel: String,
    pub text: String,
}

#[derive(Default)]
struct ChatState {
    scripted: VecDeque<ChatResponse>,
    posts: Vec<RecordedPost>,
}

/// Chat fake that records every post and replays scripted responses, then
/// answers `ok` once the script runs out.
#[derive(Clone, Default)]
pub struct RecordingChat {
    state: Arc<Mutex<ChatState>>,
}

impl RecordingChat {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn scripted(responses: Vec<ChatResponse>) -> Self {
        Self {
            state: Arc::new(Mutex::new(ChatState {
                scripted: responses.into(),
                posts: Vec::new(),
            })),
        }
    }

    pub async fn posts(&self) -> Vec<RecordedPost> {
        self.state.lock().await.posts.clone()
    }

    pub async fn texts(&self) -> Vec<String> {
        self.posts().await.into_iter().map(|post| post.text).collect()
    }
}

#[async_trait]
impl ChatApi for RecordingChat {
    async fn post_message(
        &self,
        token: Option<&SecretString>,
        channel: &str,
        text: &str,
    ) -> Result<ChatResponse, ChatError> {
        let mut state = self.state.lock().await;
        state.posts.push(RecordedPost {
            token: token.map(|token| token.expose_secret().to_owned()),
            channel: channel.to_owned(),
            text: text.to_owned(),
        });
        Ok(state.scripted.pop_front().unwrap_or(ChatResponse {
            ok: true,
            error: None,
            ts: Some("1700000000.000100".to_owned()),
        }))
    }
}

/// Robot over an in-memory store seeded with the token `xoxb-initial`.
pub async fn robot_with(
    apps: &[&str],
    chat: RecordingChat,
) -> (Robot, Arc<InMemoryParameterStore>) {
    let store = Arc::new(InMemoryParameterStore::default());
    store
        .put_parameter(TOKEN_KEY, "xoxb-initial", ParameterType::SecureString)
        .await
        .expect("seed token");
    let registry = CommandRegistry::from_app_names(apps.iter().copied(), "!").expect("registry");
    let robot = Robot::new(TOKEN_KEY, registry, store.clone(), Arc::new(chat));
    (robot, store)
}
