//! Exit codes: `0` ok, `2` configuration or registry, `3` runtime init,
//! `4` backend connect, `5` operation failure.

pub mod brain;
pub mod config;
pub mod doctor;
pub mod enqueue;
pub mod poll;
pub mod usage;

use queuebot_core::config::LoadOptions;
use queuebot_worker::{bootstrap, init_logging, Application, BootstrapError};
use serde::Serialize;
use tokio::runtime::Runtime;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

pub(crate) fn runtime(command: &str) -> Result<Runtime, CommandResult> {
    tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
        CommandResult::failure(
            command,
            "runtime_init",
            format!("failed to initialize async runtime: {error}"),
            3,
        )
    })
}

/// Bootstraps from the environment and installs stderr logging.
pub(crate) async fn load_application(command: &str) -> Result<Application, CommandResult> {
    let app = bootstrap(LoadOptions::default())
        .await
        .map_err(|error| bootstrap_failure(command, &error))?;
    init_logging(&app.config.logging);
    Ok(app)
}

fn bootstrap_failure(command: &str, error: &BootstrapError) -> CommandResult {
    match error {
        BootstrapError::Config(error) => CommandResult::failure(
            command,
            "config_validation",
            format!("configuration issue: {error}"),
            2,
        ),
        BootstrapError::Registry(error) => {
            CommandResult::failure(command, "registry", error.to_string(), 2)
        }
        other => CommandResult::failure(command, "backend_connect", other.to_string(), 4),
    }
}
