use std::time::Duration;

use async_trait::async_trait;

use crate::errors::QueueError;

/// SQS caps a single receive at ten messages.
pub const MAX_RECEIVE_BATCH: usize = 10;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueueMessage {
    pub message_id: String,
    pub receipt_handle: String,
    pub body: String,
}

#[async_trait]
pub trait MessageQueue: Send + Sync {
    /// Enqueues `body` and returns the assigned message id.
    async fn send_message(&self, body: &str) -> Result<String, QueueError>;

    /// Receives up to `max_messages` visible messages, waiting at most `wait`.
    async fn receive_messages(
        &self,
        max_messages: usize,
        wait: Duration,
    ) -> Result<Vec<QueueMessage>, QueueError>;

    async fn delete_message(&self, receipt_handle: &str) -> Result<(), QueueError>;
}
