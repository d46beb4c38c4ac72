use aws_lambda_events::sqs::{BatchItemFailure, SqsBatchResponse, SqsEvent};
use queuebot_core::queue::{MessageQueue, QueueMessage};
use queuebot_slack::consumer::{handle_batch, BatchReport};
use queuebot_slack::robot::Robot;
use tracing::{info, warn};

/// Runs one Lambda SQS delivery through the batch handler and reports the
/// records to redeliver as `batchItemFailures`.
pub async fn handle_sqs_event(
    robot: &Robot,
    queue: &dyn MessageQueue,
    event: SqsEvent,
) -> SqsBatchResponse {
    let mut report = BatchReport::default();
    let mut messages = Vec::with_capacity(event.records.len());

    for record in event.records {
        let Some(message_id) = record.message_id else {
            warn!(
                event_name = "lambda.record.missing_id",
                "dropping SQS record without a message id"
            );
            continue;
        };

        match (record.receipt_handle, record.body) {
            (Some(receipt_handle), Some(body)) => {
                messages.push(QueueMessage { message_id, receipt_handle, body });
            }
            _ => {
                warn!(
                    event_name = "lambda.record.incomplete",
                    correlation_id = %message_id,
                    "SQS record lacks a receipt handle or body"
                );
                report.push_failure(message_id, "record lacks a receipt handle or body");
            }
        }
    }

    let handled = handle_batch(robot, queue, &messages).await;
    report.records.extend(handled.records);

    let mut response = SqsBatchResponse::default();
    for message_id in report.failed_message_ids() {
        let mut failure = BatchItemFailure::default();
        failure.item_identifier = message_id;
        response.batch_item_failures.push(failure);
    }

    info!(
        event_name = "lambda.batch.completed",
        records = report.len(),
        acknowledged = report.acknowledged_count(),
        failures = response.batch_item_failures.len(),
        "SQS batch handled"
    );
    response
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use aws_lambda_events::sqs::{SqsEvent, SqsMessage};
    use queuebot_core::event::Event;
    use queuebot_core::memory::{InMemoryMessageQueue, InMemoryParameterStore};
    use queuebot_core::queue::{MessageQueue, QueueMessage};
    use queuebot_slack::chat::{ChatApi, ChatError, ChatResponse};
    use queuebot_slack::commands::CommandRegistry;
    use queuebot_slack::robot::Robot;
    use secrecy::SecretString;

    use super::handle_sqs_event;

    struct OkChat;

    #[async_trait]
    impl ChatApi for OkChat {
        async fn post_message(
            &self,
            _token: Option<&SecretString>,
            _channel: &str,
            _text: &str,
        ) -> Result<ChatResponse, ChatError> {
            Ok(ChatResponse { ok: true, error: None, ts: None })
        }
    }

    fn robot() -> Robot {
        let registry = CommandRegistry::from_app_names(["ping"], "!").expect("registry");
        Robot::new(
            "/queuebot/slack/access-token",
            registry,
            Arc::new(InMemoryParameterStore::default()),
            Arc::new(OkChat),
        )
    }

    fn sqs_record(message: &QueueMessage) -> SqsMessage {
        let mut record = SqsMessage::default();
        record.message_id = Some(message.message_id.clone());
        record.receipt_handle = Some(message.receipt_handle.clone());
        record.body = Some(message.body.clone());
        record
    }

    #[tokio::test]
    async fn only_undecodable_and_incomplete_records_are_reported() {
        let queue = InMemoryMessageQueue::new();
        let ping = Event::new("C1", "U1", "!ping").encode().expect("encode");
        queue.send_message(&ping).await.expect("send");
        queue.send_message("not json").await.expect("send");
        let received = queue.receive_messages(10, Duration::ZERO).await.expect("receive");

        let mut incomplete = SqsMessage::default();
        incomplete.message_id = Some("m-incomplete".to_owned());

        let mut event = SqsEvent::default();
        event.records = received.iter().map(sqs_record).collect();
        event.records.push(incomplete);

        let response = handle_sqs_event(&robot(), &queue, event).await;

        let failed: Vec<String> = response
            .batch_item_failures
            .into_iter()
            .map(|failure| failure.item_identifier)
            .collect();
        assert_eq!(failed, vec!["m-incomplete".to_owned(), received[1].message_id.clone()]);
        assert_eq!(queue.in_flight_len().await, 1);
    }

    #[tokio::test]
    async fn empty_event_yields_empty_response() {
        let queue = InMemoryMessageQueue::new();

        let response = handle_sqs_event(&robot(), &queue, SqsEvent::default()).await;

        assert!(response.batch_item_failures.is_empty());
    }
}
