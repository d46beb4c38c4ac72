use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use queuebot_core::config::{AppConfig, LoadOptions};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key_path, env_keys, value) in effective_fields(&config) {
        let source =
            field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref());
        lines.push(render_line(key_path, &value, source));
    }

    lines.join("\n")
}

type Field = (&'static str, &'static [&'static str], String);

fn effective_fields(config: &AppConfig) -> [Field; 14] {
    [
        ("bot.access_token_key", &["ACCESS_TOKEN_KEY"], config.bot.access_token_key.clone()),
        ("bot.command_prefix", &["CMD_PREFIX"], config.bot.command_prefix.clone()),
        ("bot.apps", &["APPS"], config.bot.apps.join(",")),
        ("queue.url", &["QUEUE_URL"], config.queue.url.clone()),
        (
            "queue.batch_size",
            &["QUEUEBOT_QUEUE_BATCH_SIZE"],
            config.queue.batch_size.to_string(),
        ),
        (
            "queue.wait_time_secs",
            &["QUEUEBOT_QUEUE_WAIT_TIME_SECS"],
            config.queue.wait_time_secs.to_string(),
        ),
        (
            "queue.visibility_timeout_secs",
            &["QUEUEBOT_QUEUE_VISIBILITY_TIMEOUT_SECS"],
            config.queue.visibility_timeout_secs.to_string(),
        ),
        (
            "chat.post_message_url",
            &["QUEUEBOT_CHAT_POST_MESSAGE_URL"],
            config.chat.post_message_url.clone(),
        ),
        (
            "chat.timeout_secs",
            &["QUEUEBOT_CHAT_TIMEOUT_SECS"],
            config.chat.timeout_secs.to_string(),
        ),
        ("backend.kind", &["QUEUEBOT_BACKEND"], format!("{:?}", config.backend.kind)),
        (
            "backend.aws_region",
            &["QUEUEBOT_AWS_REGION"],
            config.backend.aws_region.clone().unwrap_or_else(|| "<sdk default>".to_string()),
        ),
        (
            "backend.database_url",
            &["QUEUEBOT_DATABASE_URL"],
            config.backend.database_url.clone(),
        ),
        (
            "logging.level",
            &["QUEUEBOT_LOGGING_LEVEL", "QUEUEBOT_LOG_LEVEL"],
            config.logging.level.clone(),
        ),
        (
            "logging.format",
            &["QUEUEBOT_LOGGING_FORMAT", "QUEUEBOT_LOG_FORMAT"],
            format!("{:?}", config.logging.format),
        ),
    ]
}

pub(crate) fn detect_config_path() -> Option<PathBuf> {
    ["queuebot.toml", "config/queuebot.toml"]
        .into_iter()
        .map(PathBuf::from)
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

#[cfg(test)]
mod tests {
    use super::{contains_path, field_source};

    #[test]
    fn nested_keys_are_found_in_file_doc() {
        let doc: toml::Value = "[queue]\nbatch_size = 5\n".parse().expect("toml");

        assert!(contains_path(&doc, "queue.batch_size"));
        assert!(!contains_path(&doc, "queue.url"));
        assert!(!contains_path(&doc, "bot.apps"));
    }

    #[test]
    fn unset_field_reports_default_source() {
        let source = field_source("chat.timeout_secs", &["QUEUEBOT_TEST_NEVER_SET"], None, None);

        assert_eq!(source, "default");
    }
}
