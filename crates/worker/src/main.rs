use std::sync::Arc;

use aws_lambda_events::sqs::{SqsBatchResponse, SqsEvent};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use queuebot_core::config::{AppConfig, LoadOptions};
use queuebot_worker::{bootstrap_with_config, handle_sqs_event, init_logging, Application};

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config.logging);

    let app = Arc::new(bootstrap_with_config(config).await?);
    tracing::info!(
        event_name = "system.worker.started",
        correlation_id = "bootstrap",
        prefix = %app.config.bot.command_prefix,
        "queuebot worker waiting for SQS batches"
    );

    run(service_fn(move |event: LambdaEvent<SqsEvent>| {
        let app = Arc::clone(&app);
        async move { handle(&app, event).await }
    }))
    .await
}

async fn handle(
    app: &Application,
    event: LambdaEvent<SqsEvent>,
) -> Result<SqsBatchResponse, Error> {
    Ok(handle_sqs_event(&app.robot, app.queue.as_ref(), event.payload).await)
}
