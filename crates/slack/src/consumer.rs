use std::time::Duration;

use queuebot_core::errors::QueueError;
use queuebot_core::event::Event;
use queuebot_core::queue::{MessageQueue, QueueMessage};
use tracing::{info, warn};

use crate::robot::{DispatchOutcome, Robot};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Dispatch completed and the message was deleted.
    Acknowledged(DispatchOutcome),
    /// Dispatch completed but the delete call failed; the queue may redeliver.
    AckFailed { dispatch: DispatchOutcome, error: String },
    /// The body could not be decoded; the message is left in the queue.
    Failed { error: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchRecord {
    pub message_id: String,
    pub outcome: RecordOutcome,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub records: Vec<BatchRecord>,
}

impl BatchReport {
    /// Ids to report back as `batchItemFailures`.
    pub fn failed_message_ids(&self) -> Vec<String> {
        self.records
            .iter()
            .filter(|record| matches!(record.outcome, RecordOutcome::Failed { .. }))
            .map(|record| record.message_id.clone())
            .collect()
    }

    pub fn acknowledged_count(&self) -> usize {
        self.records
            .iter()
            .filter(|record| matches!(record.outcome, RecordOutcome::Acknowledged(_)))
            .count()
    }

    /// Records whose handler returned an error, whether or not the delete went through.
    pub fn handler_failed_count(&self) -> usize {
        self.records
            .iter()
            .filter(|record| {
                matches!(
                    record.outcome,
                    RecordOutcome::Acknowledged(DispatchOutcome::HandlerFailed { .. })
                        | RecordOutcome::AckFailed {
                            dispatch: DispatchOutcome::HandlerFailed { .. },
                            ..
                        }
                )
            })
            .count()
    }

    pub fn push_failure(&mut self, message_id: impl Into<String>, error: impl Into<String>) {
        self.records.push(BatchRecord {
            message_id: message_id.into(),
            outcome: RecordOutcome::Failed { error: error.into() },
        });
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Handles `messages` one at a time, in order. A message is deleted once its
/// dispatch completed, whatever the outcome; undecodable bodies stay queued.
pub async fn handle_batch(
    robot: &Robot,
    queue: &dyn MessageQueue,
    messages: &[QueueMessage],
) -> BatchReport {
    let mut report = BatchReport::default();

    for message in messages {
        let event = match Event::decode(&message.body) {
            Ok(event) => event,
            Err(decode_error) => {
                warn!(
                    event_name = "consumer.record.decode_failed",
                    correlation_id = %message.message_id,
                    error = %decode_error,
                    "leaving undecodable message in queue"
                );
                report.push_failure(message.message_id.clone(), decode_error.to_string());
                continue;
            }
        };

        let dispatch = robot.handle_event(&event).await;
        info!(
            event_name = "consumer.record.dispatched",
            correlation_id = %message.message_id,
            channel = %event.channel,
            outcome = dispatch.label(),
            "queue record dispatched"
        );

        let outcome = match queue.delete_message(&message.receipt_handle).await {
            Ok(()) => RecordOutcome::Acknowledged(dispatch),
            Err(delete_error) => {
                warn!(
                    event_name = "consumer.record.delete_failed",
                    correlation_id = %message.message_id,
                    error = %delete_error,
                    "dispatched message could not be deleted"
                );
                RecordOutcome::AckFailed { dispatch, error: delete_error.to_string() }
            }
        };
        report.records.push(BatchRecord { message_id: message.message_id.clone(), outcome });
    }

    report
}

/// Receives one batch and handles it. An empty receive yields an empty report.
pub async fn poll_once(
    robot: &Robot,
    queue: &dyn MessageQueue,
    batch_size: usize,
    wait: Duration,
) -> Result<BatchReport, QueueError> {
    let messages = queue.receive_messages(batch_size, wait).await?;
    if messages.is_empty() {
        return Ok(BatchReport::default());
    }

    info!(event_name = "consumer.batch.received", size = messages.len(), "received queue batch");
    Ok(handle_batch(robot, queue, &messages).await)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use queuebot_core::errors::QueueError;
    use queuebot_core::event::Event;
    use queuebot_core::memory::{InMemoryMessageQueue, InMemoryParameterStore};
    use queuebot_core::queue::{MessageQueue, QueueMessage};

    use super::{handle_batch, poll_once, RecordOutcome};
    use crate::commands::{AppError, CommandApp, CommandRegistry};
    use crate::robot::{DispatchOutcome, Robot};
    use crate::testing::{robot_with, RecordingChat, TOKEN_KEY};

    struct FailingApp;

    #[async_trait]
    impl CommandApp for FailingApp {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn commands(&self) -> &'static [&'static str] {
            &["fail"]
        }

        fn doc(&self) -> &'static str {
            "Fails every time."
        }

        async fn run(
            &self,
            _robot: &Robot,
            _channel: &str,
            _user: &str,
            _payload: &str,
        ) -> Result<(), AppError> {
            Err(AppError::Rejected("nope".to_owned()))
        }
    }

    /// Queue whose deletes always fail.
    struct StuckQueue;

    #[async_trait]
    impl MessageQueue for StuckQueue {
        async fn send_message(&self, _body: &str) -> Result<String, QueueError> {
            Ok("m-1".to_owned())
        }

        async fn receive_messages(
            &self,
            _max_messages: usize,
            _wait: Duration,
        ) -> Result<Vec<QueueMessage>, QueueError> {
            Ok(Vec::new())
        }

        async fn delete_message(&self, _receipt_handle: &str) -> Result<(), QueueError> {
            Err(QueueError::Backend("throttled".to_owned()))
        }
    }

    async fn enqueue(queue: &InMemoryMessageQueue, text: &str) {
        let body = Event::new("C1", "U1", text).encode().expect("encode");
        queue.send_message(&body).await.expect("send");
    }

    #[tokio::test]
    async fn command_plain_and_empty_text_are_all_deleted() {
        let chat = RecordingChat::ok();
        let (robot, _store) = robot_with(&["ping"], chat.clone()).await;
        let queue = InMemoryMessageQueue::new();
        enqueue(&queue, "!ping").await;
        enqueue(&queue, "hello").await;
        enqueue(&queue, "").await;

        let report = poll_once(&robot, &queue, 10, Duration::ZERO).await.expect("poll");

        assert_eq!(report.len(), 3);
        assert_eq!(
            report.records[0].outcome,
            RecordOutcome::Acknowledged(DispatchOutcome::Dispatched { keyword: "ping".to_owned() })
        );
        assert_eq!(
            report.records[1].outcome,
            RecordOutcome::Acknowledged(DispatchOutcome::NotACommand)
        );
        assert_eq!(
            report.records[2].outcome,
            RecordOutcome::Acknowledged(DispatchOutcome::NotACommand)
        );
        assert_eq!(report.acknowledged_count(), 3);
        assert_eq!(chat.texts().await, vec!["pong".to_owned()]);
        assert_eq!(queue.in_flight_len().await, 0);
        assert_eq!(queue.pending_len().await, 0);
        assert!(report.failed_message_ids().is_empty());
    }

    #[tokio::test]
    async fn handler_failure_still_deletes_the_message() {
        let mut registry = CommandRegistry::new("!");
        registry.register(Arc::new(FailingApp)).expect("register");
        let store = Arc::new(InMemoryParameterStore::default());
        let robot = Robot::new(TOKEN_KEY, registry, store, Arc::new(RecordingChat::ok()));
        let queue = InMemoryMessageQueue::new();
        enqueue(&queue, "!fail").await;

        let report = poll_once(&robot, &queue, 10, Duration::ZERO).await.expect("poll");

        assert!(matches!(
            report.records[0].outcome,
            RecordOutcome::Acknowledged(DispatchOutcome::HandlerFailed { .. })
        ));
        assert_eq!(queue.in_flight_len().await, 0);
        assert_eq!(report.acknowledged_count(), 1);
        assert_eq!(report.handler_failed_count(), 1);
    }

    #[tokio::test]
    async fn undecodable_body_is_left_in_the_queue() {
        let (robot, _store) = robot_with(&["ping"], RecordingChat::ok()).await;
        let queue = InMemoryMessageQueue::new();
        let bad_id = queue.send_message(r#"{"channel":"C1","text":"!ping"}"#).await.expect("send");
        enqueue(&queue, "!ping").await;

        let report = poll_once(&robot, &queue, 10, Duration::ZERO).await.expect("poll");

        assert_eq!(report.failed_message_ids(), vec![bad_id]);
        assert_eq!(report.acknowledged_count(), 1);
        assert_eq!(queue.in_flight_len().await, 1);
        assert_eq!(queue.requeue_in_flight().await, 1);
    }

    #[tokio::test]
    async fn delete_failure_is_reported_but_not_an_item_failure() {
        let (robot, _store) = robot_with(&["ping"], RecordingChat::ok()).await;
        let message = QueueMessage {
            message_id: "m-1".to_owned(),
            receipt_handle: "rh-1".to_owned(),
            body: Event::new("C1", "U1", "!ping").encode().expect("encode"),
        };

        let report = handle_batch(&robot, &StuckQueue, &[message]).await;

        assert!(matches!(report.records[0].outcome, RecordOutcome::AckFailed { .. }));
        assert!(report.failed_message_ids().is_empty());
    }

    #[tokio::test]
    async fn empty_receive_yields_empty_report() {
        let (robot, _store) = robot_with(&["ping"], RecordingChat::ok()).await;
        let queue = InMemoryMessageQueue::new();

        let report = poll_once(&robot, &queue, 10, Duration::ZERO).await.expect("poll");

        assert!(report.is_empty());
    }
}
