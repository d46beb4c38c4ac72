use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use queuebot_core::errors::StoreError;
use thiserror::Error;
use tracing::warn;

use crate::apps::builtin_app;
use crate::chat::ChatError;
use crate::robot::Robot;

const USAGE_RULE: &str = "==============";

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Chat(#[from] ChatError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("command rejected: {0}")]
    Rejected(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("unknown app `{0}`")]
    UnknownApp(String),
    #[error("app `{0}` exposes no commands")]
    NoCommands(String),
}

/// A named bundle of command keywords sharing one handler.
#[async_trait]
pub trait CommandApp: Send + Sync {
    fn name(&self) -> &'static str;

    fn commands(&self) -> &'static [&'static str];

    fn doc(&self) -> &'static str;

    async fn run(
        &self,
        robot: &Robot,
        channel: &str,
        user: &str,
        payload: &str,
    ) -> Result<(), AppError>;
}

/// Splits `<prefix><keyword>[ <payload>]` into `(keyword, payload)`.
///
/// Returns `None` for empty text or text without the prefix.
pub fn extract_command(prefix: &str, text: &str) -> Option<(String, String)> {
    if text.is_empty() {
        return None;
    }
    let rest = text.strip_prefix(prefix)?;

    match rest.split_once(' ') {
        Some((keyword, payload)) => Some((keyword.to_owned(), payload.to_owned())),
        None => Some((rest.to_owned(), String::new())),
    }
}

pub struct CommandRegistry {
    prefix: String,
    commands: HashMap<String, Arc<dyn CommandApp>>,
    usage: Vec<String>,
}

impl CommandRegistry {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            commands: HashMap::new(),
            usage: vec![USAGE_RULE.to_owned(), "Usage".to_owned(), USAGE_RULE.to_owned()],
        }
    }

    /// Resolves every name against the built-in catalog. Any unknown name
    /// fails the whole build.
    pub fn from_app_names<I, S>(names: I, prefix: &str) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut registry = Self::new(prefix);
        for name in names {
            let name = name.as_ref();
            let app = builtin_app(name).ok_or_else(|| RegistryError::UnknownApp(name.to_owned()))?;
            registry.register(app)?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, app: Arc<dyn CommandApp>) -> Result<(), RegistryError> {
        let commands = app.commands();
        if commands.is_empty() {
            return Err(RegistryError::NoCommands(app.name().to_owned()));
        }

        for keyword in commands {
            if let Some(previous) = self.commands.insert((*keyword).to_owned(), Arc::clone(&app)) {
                warn!(
                    event_name = "registry.keyword_collision",
                    keyword = *keyword,
                    replaced_app = previous.name(),
                    app = app.name(),
                    "command keyword registered twice; last registration wins"
                );
            }
        }
        self.usage.push(format!("{}[{}]: {}", self.prefix, commands.join("|"), app.doc()));
        Ok(())
    }

    pub fn lookup(&self, keyword: &str) -> Option<Arc<dyn CommandApp>> {
        self.commands.get(keyword).cloned()
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn usage(&self) -> &[String] {
        &self.usage
    }

    pub fn usage_text(&self) -> String {
        self.usage.join("\n")
    }

    pub fn keywords(&self) -> Vec<&str> {
        let mut keywords: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        keywords.sort_unstable();
        keywords
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::{extract_command, AppError, CommandApp, CommandRegistry, RegistryError};
    use crate::robot::Robot;

    struct StaticApp {
        name: &'static str,
        commands: &'static [&'static str],
    }

    #[async_trait]
    impl CommandApp for StaticApp {
        fn name(&self) -> &'static str {
            self.name
        }

        fn commands(&self) -> &'static [&'static str] {
            self.commands
        }

        fn doc(&self) -> &'static str {
            "test app"
        }

        async fn run(
            &self,
            _robot: &Robot,
            _channel: &str,
            _user: &str,
            _payload: &str,
        ) -> Result<(), AppError> {
            Ok(())
        }
    }

    #[test]
    fn extract_splits_keyword_and_payload_on_first_space() {
        assert_eq!(
            extract_command("!", "!echo hello world"),
            Some(("echo".to_owned(), "hello world".to_owned()))
        );
        assert_eq!(extract_command("!", "!ping"), Some(("ping".to_owned(), String::new())));
        assert_eq!(
            extract_command("!", "!echo  spaced"),
            Some(("echo".to_owned(), " spaced".to_owned()))
        );
    }

    #[test]
    fn extract_ignores_text_without_prefix() {
        assert_eq!(extract_command("!", "hello"), None);
        assert_eq!(extract_command("!", ""), None);
        assert_eq!(extract_command("bot ", "bot"), None);
    }

    #[test]
    fn extract_with_multi_char_prefix() {
        assert_eq!(
            extract_command("bot:", "bot:memo get k"),
            Some(("memo".to_owned(), "get k".to_owned()))
        );
    }

    #[test]
    fn empty_prefix_accepts_any_text() {
        assert_eq!(extract_command("", "ping"), Some(("ping".to_owned(), String::new())));
        assert_eq!(extract_command("", ""), None);
    }

    #[test]
    fn usage_has_banner_then_one_line_per_app() {
        let registry = CommandRegistry::from_app_names(["ping", "echo"], "!").expect("registry");

        assert_eq!(
            registry.usage(),
            &[
                "==============".to_owned(),
                "Usage".to_owned(),
                "==============".to_owned(),
                "![ping]: Replies with pong.".to_owned(),
                "![echo|say]: Repeats the given text back to the channel.".to_owned(),
            ]
        );
        assert_eq!(registry.keywords(), vec!["echo", "ping", "say"]);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn unknown_app_fails_the_whole_registry() {
        let error = CommandRegistry::from_app_names(["ping", "weather"], "!")
            .err()
            .expect("unknown app should fail");

        assert_eq!(error, RegistryError::UnknownApp("weather".to_owned()));
    }

    #[test]
    fn colliding_keyword_is_won_by_last_registration() {
        let mut registry = CommandRegistry::new("!");
        registry
            .register(Arc::new(StaticApp { name: "first", commands: &["go"] }))
            .expect("first");
        registry
            .register(Arc::new(StaticApp { name: "second", commands: &["go", "stop"] }))
            .expect("second");

        let app = registry.lookup("go").expect("registered");
        assert_eq!(app.name(), "second");
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.usage().len(), 5);
    }

    #[test]
    fn app_without_commands_is_rejected() {
        let mut registry = CommandRegistry::new("!");
        let error = registry
            .register(Arc::new(StaticApp { name: "mute", commands: &[] }))
            .expect_err("no commands");

        assert_eq!(error, RegistryError::NoCommands("mute".to_owned()));
        assert!(registry.is_empty());
    }
}
