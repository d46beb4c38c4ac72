use std::time::Duration;

use queuebot_slack::consumer::poll_once;

use crate::commands::{load_application, runtime, CommandResult};

/// Runs `batches` receive rounds; an empty receive ends the run early.
pub fn run(batches: u32) -> CommandResult {
    let runtime = match runtime("poll") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    runtime.block_on(async {
        let app = match load_application("poll").await {
            Ok(app) => app,
            Err(failure) => return failure,
        };
        let batch_size = usize::try_from(app.config.queue.batch_size).unwrap_or(10);
        let wait = Duration::from_secs(u64::from(app.config.queue.wait_time_secs));

        let mut received = 0usize;
        let mut acknowledged = 0usize;
        let mut handler_failed = 0usize;
        let mut failed = Vec::new();
        for _ in 0..batches {
            let report = match poll_once(&app.robot, app.queue.as_ref(), batch_size, wait).await {
                Ok(report) => report,
                Err(error) => return CommandResult::failure("poll", "queue", error.to_string(), 5),
            };
            if report.is_empty() {
                break;
            }
            received += report.len();
            acknowledged += report.acknowledged_count();
            handler_failed += report.handler_failed_count();
            failed.extend(report.failed_message_ids());
        }

        let mut message = format!(
            "handled {received} message(s), acknowledged {acknowledged}, handler_failed {handler_failed}"
        );
        if !failed.is_empty() {
            message.push_str(&format!(", left {} in queue: {}", failed.len(), failed.join(", ")));
        }
        CommandResult::success("poll", message)
    })
}
