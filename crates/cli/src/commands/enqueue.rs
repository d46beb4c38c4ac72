use queuebot_core::event::Event;

use crate::commands::{load_application, runtime, CommandResult};

pub fn run(channel: &str, user: &str, text: &str) -> CommandResult {
    let runtime = match runtime("enqueue") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    runtime.block_on(async {
        let app = match load_application("enqueue").await {
            Ok(app) => app,
            Err(failure) => return failure,
        };

        let body = match Event::new(channel, user, text).encode() {
            Ok(body) => body,
            Err(error) => return CommandResult::failure("enqueue", "encode", error.to_string(), 5),
        };

        match app.queue.send_message(&body).await {
            Ok(message_id) => CommandResult::success(
                "enqueue",
                format!("sent message `{message_id}` to `{}`", app.config.queue.url),
            ),
            Err(error) => CommandResult::failure("enqueue", "queue", error.to_string(), 5),
        }
    })
}
