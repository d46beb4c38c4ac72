use queuebot_core::config::{AppConfig, LoadOptions};
use queuebot_slack::commands::CommandRegistry;

use crate::commands::CommandResult;

/// Prints the usage document as plain text; failures use the JSON envelope.
pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "usage",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    match CommandRegistry::from_app_names(&config.bot.apps, &config.bot.command_prefix) {
        Ok(registry) => CommandResult { exit_code: 0, output: registry.usage_text() },
        Err(error) => CommandResult::failure("usage", "registry", error.to_string(), 2),
    }
}
