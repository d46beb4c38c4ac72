use queuebot_core::brain::ParameterType;

use crate::commands::{load_application, runtime, CommandResult};

pub fn get(key: &str) -> CommandResult {
    let runtime = match runtime("brain.get") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    runtime.block_on(async {
        let app = match load_application("brain.get").await {
            Ok(app) => app,
            Err(failure) => return failure,
        };

        match app.robot.brain().get(key).await {
            Ok(value) => CommandResult::success("brain.get", value),
            Err(error) => {
                CommandResult::failure("brain.get", "parameter_store", error.to_string(), 5)
            }
        }
    })
}

/// `secure` writes a `SecureString`, which is how the access token is stored.
pub fn put(key: &str, value: &str, secure: bool) -> CommandResult {
    let runtime = match runtime("brain.put") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    runtime.block_on(async {
        let app = match load_application("brain.put").await {
            Ok(app) => app,
            Err(failure) => return failure,
        };

        let result = if secure {
            app.store.put_parameter(key, value, ParameterType::SecureString).await
        } else {
            app.robot.brain().store(key, value).await
        };

        match result {
            Ok(()) => CommandResult::success("brain.put", format!("stored `{key}`")),
            Err(error) => {
                CommandResult::failure("brain.put", "parameter_store", error.to_string(), 5)
            }
        }
    })
}

pub fn list(path: &str, max: usize) -> CommandResult {
    let runtime = match runtime("brain.list") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    runtime.block_on(async {
        let app = match load_application("brain.list").await {
            Ok(app) => app,
            Err(failure) => return failure,
        };

        match app.robot.brain().get_list_with_limit(path, max).await {
            Ok(parameters) => {
                let lines: Vec<String> = parameters
                    .iter()
                    .map(|parameter| match parameter.parameter_type {
                        ParameterType::SecureString => format!("{} = <secure>", parameter.name),
                        ParameterType::String => {
                            format!("{} = {}", parameter.name, parameter.value)
                        }
                    })
                    .collect();
                CommandResult::success("brain.list", lines.join("\n"))
            }
            Err(error) => {
                CommandResult::failure("brain.list", "parameter_store", error.to_string(), 5)
            }
        }
    })
}
