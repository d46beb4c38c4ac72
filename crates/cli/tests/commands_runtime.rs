use std::env;
use std::sync::{Mutex, OnceLock};

use queuebot_cli::commands::{brain, doctor, enqueue, poll, usage};
use serde_json::Value;

fn local_env(database_url: &str) -> Vec<(&'static str, String)> {
    vec![
        ("ACCESS_TOKEN_KEY", "/queuebot/slack/access-token".to_string()),
        ("CMD_PREFIX", "!".to_string()),
        ("APPS", r#"["ping","echo","help","memo"]"#.to_string()),
        ("QUEUE_URL", "local-bot".to_string()),
        ("QUEUEBOT_BACKEND", "local".to_string()),
        ("QUEUEBOT_DATABASE_URL", database_url.to_string()),
        ("QUEUEBOT_QUEUE_WAIT_TIME_SECS", "0".to_string()),
    ]
}

fn temp_database_url(dir: &tempfile::TempDir) -> String {
    format!("sqlite://{}", dir.path().join("queuebot.db").display())
}

#[test]
fn usage_prints_banner_and_app_lines() {
    let vars = local_env("sqlite::memory:");
    with_env(&vars, || {
        let result = usage::run();
        assert_eq!(result.exit_code, 0, "expected usage to succeed");

        let lines: Vec<&str> = result.output.lines().collect();
        assert_eq!(lines[..3], ["==============", "Usage", "=============="]);
        assert!(result.output.contains("![echo|say]: "));
        assert!(result.output.contains("![ping]: Replies with pong."));
    });
}

#[test]
fn usage_rejects_unknown_app() {
    let mut vars = local_env("sqlite::memory:");
    vars.retain(|(key, _)| *key != "APPS");
    vars.push(("APPS", "ping,weather".to_string()));
    with_env(&vars, || {
        let result = usage::run();
        assert_eq!(result.exit_code, 2, "expected registry failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "usage");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "registry");
    });
}

#[test]
fn enqueue_returns_config_failure_without_required_env() {
    with_env(&[], || {
        let result = enqueue::run("C1", "U1", "!ping");
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "enqueue");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn brain_put_get_and_list_share_the_local_store() {
    let dir = tempfile::tempdir().expect("tempdir");
    let vars = local_env(&temp_database_url(&dir));
    with_env(&vars, || {
        assert_eq!(brain::put("/queuebot/memo/U1/lunch", "noodles", false).exit_code, 0);
        assert_eq!(brain::put("/queuebot/slack/access-token", "xoxb-1", true).exit_code, 0);

        let got = parse_payload(&brain::get("/queuebot/memo/U1/lunch").output);
        assert_eq!(got["message"], "noodles");

        let missing = parse_payload(&brain::get("/queuebot/memo/U1/dinner").output);
        assert_eq!(missing["status"], "ok");
        assert_eq!(missing["message"], "");

        let listed = parse_payload(&brain::list("/queuebot", 10).output);
        let message = listed["message"].as_str().unwrap_or("");
        assert!(message.contains("/queuebot/memo/U1/lunch = noodles"));
        assert!(message.contains("/queuebot/slack/access-token = <secure>"));
    });
}

#[test]
fn enqueued_plain_text_is_acknowledged_by_poll() {
    let dir = tempfile::tempdir().expect("tempdir");
    let vars = local_env(&temp_database_url(&dir));
    with_env(&vars, || {
        let sent = enqueue::run("C1", "U1", "just chatting");
        assert_eq!(sent.exit_code, 0, "expected enqueue to succeed: {}", sent.output);

        let polled = poll::run(2);
        assert_eq!(polled.exit_code, 0, "expected poll to succeed: {}", polled.output);
        let payload = parse_payload(&polled.output);
        assert_eq!(payload["message"], "handled 1 message(s), acknowledged 1, handler_failed 0");

        let again = parse_payload(&poll::run(1).output);
        assert_eq!(again["message"], "handled 0 message(s), acknowledged 0, handler_failed 0");
    });
}

#[test]
fn poll_counts_failed_handlers_separately() {
    let dir = tempfile::tempdir().expect("tempdir");
    let vars = local_env(&temp_database_url(&dir));
    with_env(&vars, || {
        // `/` is not allowed in a memo path segment, so the memo app rejects this user.
        let sent = enqueue::run("C1", "U/1", "!memo list");
        assert_eq!(sent.exit_code, 0, "expected enqueue to succeed: {}", sent.output);

        let polled = poll::run(1);
        assert_eq!(polled.exit_code, 0, "expected poll to succeed: {}", polled.output);
        let payload = parse_payload(&polled.output);
        assert_eq!(payload["message"], "handled 1 message(s), acknowledged 1, handler_failed 1");

        let again = parse_payload(&poll::run(1).output);
        assert_eq!(again["message"], "handled 0 message(s), acknowledged 0, handler_failed 0");
    });
}

#[test]
fn doctor_json_passes_for_local_backend() {
    let dir = tempfile::tempdir().expect("tempdir");
    let vars = local_env(&temp_database_url(&dir));
    with_env(&vars, || {
        let result = doctor::run(true);
        assert_eq!(result.exit_code, 0, "expected doctor to pass: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["overall_status"], "pass");
        let names: Vec<&str> = payload["checks"]
            .as_array()
            .map(|checks| checks.iter().filter_map(|check| check["name"].as_str()).collect())
            .unwrap_or_default();
        assert_eq!(
            names,
            ["config_file", "config_validation", "app_registry", "backend_readiness"]
        );
    });
}

#[test]
fn doctor_fails_and_skips_dependents_on_bad_config() {
    with_env(&[], || {
        let result = doctor::run(false);
        assert_eq!(result.exit_code, 1);
        assert!(result.output.starts_with("doctor: one or more readiness checks failed"));
        assert!(result.output.contains("- [fail] config_validation:"));
        assert!(result.output.contains("- [skip] app_registry:"));
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, String)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "ACCESS_TOKEN_KEY",
        "CMD_PREFIX",
        "APPS",
        "QUEUE_URL",
        "QUEUEBOT_QUEUE_BATCH_SIZE",
        "QUEUEBOT_QUEUE_WAIT_TIME_SECS",
        "QUEUEBOT_QUEUE_VISIBILITY_TIMEOUT_SECS",
        "QUEUEBOT_CHAT_POST_MESSAGE_URL",
        "QUEUEBOT_CHAT_TIMEOUT_SECS",
        "QUEUEBOT_BACKEND",
        "QUEUEBOT_AWS_REGION",
        "QUEUEBOT_DATABASE_URL",
        "QUEUEBOT_LOGGING_LEVEL",
        "QUEUEBOT_LOGGING_FORMAT",
        "QUEUEBOT_LOG_LEVEL",
        "QUEUEBOT_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
