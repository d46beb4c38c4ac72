use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_POST_MESSAGE_URL: &str = "https://slack.com/api/chat.postMessage";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub bot: BotConfig,
    pub queue: QueueConfig,
    pub chat: ChatConfig,
    pub backend: BackendConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct BotConfig {
    /// Parameter name under which the chat access token is stored (encrypted).
    pub access_token_key: String,
    pub command_prefix: String,
    pub apps: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct QueueConfig {
    pub url: String,
    pub batch_size: u32,
    pub wait_time_secs: u32,
    pub visibility_timeout_secs: u32,
}

#[derive(Clone, Debug)]
pub struct ChatConfig {
    pub post_message_url: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct BackendConfig {
    pub kind: BackendKind,
    pub aws_region: Option<String>,
    pub database_url: String,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    Aws,
    Local,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub access_token_key: Option<String>,
    pub command_prefix: Option<String>,
    pub apps: Option<Vec<String>>,
    pub queue_url: Option<String>,
    pub backend: Option<BackendKind>,
    pub database_url: Option<String>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bot: BotConfig {
                access_token_key: String::new(),
                command_prefix: String::new(),
                apps: Vec::new(),
            },
            queue: QueueConfig {
                url: String::new(),
                batch_size: 10,
                wait_time_secs: 20,
                visibility_timeout_secs: 30,
            },
            chat: ChatConfig {
                post_message_url: DEFAULT_POST_MESSAGE_URL.to_string(),
                timeout_secs: 3,
            },
            backend: BackendConfig {
                kind: BackendKind::Aws,
                aws_region: None,
                database_url: "sqlite://queuebot.db".to_string(),
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "aws" => Ok(Self::Aws),
            "local" | "sqlite" => Ok(Self::Local),
            other => Err(ConfigError::Validation(format!(
                "unsupported backend `{other}` (expected aws|local)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        let mut prefix_configured = options.overrides.command_prefix.is_some();

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            prefix_configured |=
                patch.bot.as_ref().is_some_and(|bot| bot.command_prefix.is_some());
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("queuebot.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        prefix_configured |= env::var_os("CMD_PREFIX").is_some();
        config.apply_overrides(options.overrides);

        // An empty prefix is valid and makes every message a command, so only
        // an unset prefix is an error.
        if !prefix_configured {
            return Err(ConfigError::Validation(
                "bot.command_prefix is required (set CMD_PREFIX, e.g. `!`, or `\"\"` to treat every message as a command)"
                    .to_string(),
            ));
        }
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(bot) = patch.bot {
            if let Some(access_token_key) = bot.access_token_key {
                self.bot.access_token_key = access_token_key;
            }
            if let Some(command_prefix) = bot.command_prefix {
                self.bot.command_prefix = command_prefix;
            }
            if let Some(apps) = bot.apps {
                self.bot.apps = apps;
            }
        }

        if let Some(queue) = patch.queue {
            if let Some(url) = queue.url {
                self.queue.url = url;
            }
            if let Some(batch_size) = queue.batch_size {
                self.queue.batch_size = batch_size;
            }
            if let Some(wait_time_secs) = queue.wait_time_secs {
                self.queue.wait_time_secs = wait_time_secs;
            }
            if let Some(visibility_timeout_secs) = queue.visibility_timeout_secs {
                self.queue.visibility_timeout_secs = visibility_timeout_secs;
            }
        }

        if let Some(chat) = patch.chat {
            if let Some(post_message_url) = chat.post_message_url {
                self.chat.post_message_url = post_message_url;
            }
            if let Some(timeout_secs) = chat.timeout_secs {
                self.chat.timeout_secs = timeout_secs;
            }
        }

        if let Some(backend) = patch.backend {
            if let Some(kind) = backend.kind {
                self.backend.kind = kind;
            }
            if let Some(aws_region) = backend.aws_region {
                self.backend.aws_region = Some(aws_region);
            }
            if let Some(database_url) = backend.database_url {
                self.backend.database_url = database_url;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("ACCESS_TOKEN_KEY") {
            self.bot.access_token_key = value;
        }
        if let Ok(value) = env::var("CMD_PREFIX") {
            self.bot.command_prefix = value;
        }
        if let Some(value) = read_env("APPS") {
            self.bot.apps = parse_app_list("APPS", &value)?;
        }

        if let Some(value) = read_env("QUEUE_URL") {
            self.queue.url = value;
        }
        if let Some(value) = read_env("QUEUEBOT_QUEUE_BATCH_SIZE") {
            self.queue.batch_size = parse_u32("QUEUEBOT_QUEUE_BATCH_SIZE", &value)?;
        }
        if let Some(value) = read_env("QUEUEBOT_QUEUE_WAIT_TIME_SECS") {
            self.queue.wait_time_secs = parse_u32("QUEUEBOT_QUEUE_WAIT_TIME_SECS", &value)?;
        }
        if let Some(value) = read_env("QUEUEBOT_QUEUE_VISIBILITY_TIMEOUT_SECS") {
            self.queue.visibility_timeout_secs =
                parse_u32("QUEUEBOT_QUEUE_VISIBILITY_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("QUEUEBOT_CHAT_POST_MESSAGE_URL") {
            self.chat.post_message_url = value;
        }
        if let Some(value) = read_env("QUEUEBOT_CHAT_TIMEOUT_SECS") {
            self.chat.timeout_secs = parse_u64("QUEUEBOT_CHAT_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("QUEUEBOT_BACKEND") {
            self.backend.kind = value.parse()?;
        }
        if let Some(value) = read_env("QUEUEBOT_AWS_REGION") {
            self.backend.aws_region = Some(value);
        }
        if let Some(value) = read_env("QUEUEBOT_DATABASE_URL") {
            self.backend.database_url = value;
        }

        let log_level =
            read_env("QUEUEBOT_LOGGING_LEVEL").or_else(|| read_env("QUEUEBOT_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("QUEUEBOT_LOGGING_FORMAT").or_else(|| read_env("QUEUEBOT_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(access_token_key) = overrides.access_token_key {
            self.bot.access_token_key = access_token_key;
        }
        if let Some(command_prefix) = overrides.command_prefix {
            self.bot.command_prefix = command_prefix;
        }
        if let Some(apps) = overrides.apps {
            self.bot.apps = apps;
        }
        if let Some(queue_url) = overrides.queue_url {
            self.queue.url = queue_url;
        }
        if let Some(backend) = overrides.backend {
            self.backend.kind = backend;
        }
        if let Some(database_url) = overrides.database_url {
            self.backend.database_url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_bot(&self.bot)?;
        validate_queue(&self.queue)?;
        validate_chat(&self.chat)?;
        validate_backend(&self.backend)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

/// Accepts a JSON array (`["ping","echo"]`) or a comma separated list.
pub fn parse_app_list(key: &str, value: &str) -> Result<Vec<String>, ConfigError> {
    let trimmed = value.trim();
    let names: Vec<String> = if trimmed.starts_with('[') {
        serde_json::from_str::<Vec<String>>(trimmed).map_err(|_| {
            ConfigError::InvalidEnvOverride { key: key.to_string(), value: value.to_string() }
        })?
    } else {
        trimmed.split(',').map(str::to_string).collect()
    };

    Ok(names
        .into_iter()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect())
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("queuebot.toml"), PathBuf::from("config/queuebot.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_bot(bot: &BotConfig) -> Result<(), ConfigError> {
    if bot.access_token_key.trim().is_empty() {
        return Err(ConfigError::Validation(
            "bot.access_token_key is required (set ACCESS_TOKEN_KEY to the parameter name holding the chat token)"
                .to_string(),
        ));
    }

    if bot.command_prefix.contains(char::is_whitespace) {
        return Err(ConfigError::Validation(
            "bot.command_prefix must not contain whitespace".to_string(),
        ));
    }

    if bot.apps.is_empty() {
        return Err(ConfigError::Validation(
            "bot.apps must name at least one app (set APPS, e.g. `[\"ping\",\"help\"]`)"
                .to_string(),
        ));
    }

    Ok(())
}

fn validate_queue(queue: &QueueConfig) -> Result<(), ConfigError> {
    if queue.url.trim().is_empty() {
        return Err(ConfigError::Validation(
            "queue.url is required (set QUEUE_URL)".to_string(),
        ));
    }

    if queue.batch_size == 0 || queue.batch_size > 10 {
        return Err(ConfigError::Validation(
            "queue.batch_size must be in range 1..=10".to_string(),
        ));
    }

    if queue.wait_time_secs > 20 {
        return Err(ConfigError::Validation(
            "queue.wait_time_secs must be in range 0..=20".to_string(),
        ));
    }

    if queue.visibility_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "queue.visibility_timeout_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_chat(chat: &ChatConfig) -> Result<(), ConfigError> {
    let url = chat.post_message_url.trim();
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(
            "chat.post_message_url must start with http:// or https://".to_string(),
        ));
    }

    if chat.timeout_secs == 0 || chat.timeout_secs > 30 {
        return Err(ConfigError::Validation(
            "chat.timeout_secs must be in range 1..=30".to_string(),
        ));
    }

    Ok(())
}

fn validate_backend(backend: &BackendConfig) -> Result<(), ConfigError> {
    if backend.kind == BackendKind::Local {
        let url = backend.database_url.trim();
        let sqlite_url =
            url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
        if !sqlite_url {
            return Err(ConfigError::Validation(
                "backend.database_url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                    .to_string(),
            ));
        }
    }

    if let Some(region) = &backend.aws_region {
        if region.trim().is_empty() {
            return Err(ConfigError::Validation(
                "backend.aws_region must not be blank when set".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.trim().parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    bot: Option<BotPatch>,
    queue: Option<QueuePatch>,
    chat: Option<ChatPatch>,
    backend: Option<BackendPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct BotPatch {
    access_token_key: Option<String>,
    command_prefix: Option<String>,
    apps: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct QueuePatch {
    url: Option<String>,
    batch_size: Option<u32>,
    wait_time_secs: Option<u32>,
    visibility_timeout_secs: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct ChatPatch {
    post_message_url: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct BackendPatch {
    kind: Option<BackendKind>,
    aws_region: Option<String>,
    database_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
