use std::time::Duration;

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_sqs::error::DisplayErrorContext;
use aws_sdk_sqs::types::Message;
use aws_sdk_sqs::Client;
use queuebot_core::errors::QueueError;
use queuebot_core::queue::{MessageQueue, QueueMessage, MAX_RECEIVE_BATCH};
use tracing::warn;

/// SQS long-poll wait cannot exceed twenty seconds.
const MAX_WAIT_SECS: u64 = 20;

pub struct SqsMessageQueue {
    client: Client,
    queue_url: String,
}

impl SqsMessageQueue {
    pub fn new(client: Client, queue_url: impl Into<String>) -> Self {
        Self { client, queue_url: queue_url.into() }
    }

    pub fn from_sdk_config(config: &SdkConfig, queue_url: impl Into<String>) -> Self {
        Self::new(Client::new(config), queue_url)
    }

    pub fn queue_url(&self) -> &str {
        &self.queue_url
    }
}

fn backend_error(error: impl std::error::Error) -> QueueError {
    QueueError::Backend(DisplayErrorContext(&error).to_string())
}

fn from_sdk_message(message: &Message) -> Option<QueueMessage> {
    Some(QueueMessage {
        message_id: message.message_id()?.to_owned(),
        receipt_handle: message.receipt_handle()?.to_owned(),
        body: message.body()?.to_owned(),
    })
}

#[async_trait]
impl MessageQueue for SqsMessageQueue {
    async fn send_message(&self, body: &str) -> Result<String, QueueError> {
        let output = self
            .client
            .send_message()
            .queue_url(&self.queue_url)
            .message_body(body)
            .send()
            .await
            .map_err(backend_error)?;

        output
            .message_id()
            .map(str::to_owned)
            .ok_or_else(|| QueueError::Decode("SendMessage returned no message id".to_owned()))
    }

    async fn receive_messages(
        &self,
        max_messages: usize,
        wait: Duration,
    ) -> Result<Vec<QueueMessage>, QueueError> {
        let max_messages = max_messages.clamp(1, MAX_RECEIVE_BATCH) as i32;
        let wait_secs = wait.as_secs().min(MAX_WAIT_SECS) as i32;

        let output = self
            .client
            .receive_message()
            .queue_url(&self.queue_url)
            .max_number_of_messages(max_messages)
            .wait_time_seconds(wait_secs)
            .send()
            .await
            .map_err(backend_error)?;

        let mut received = Vec::new();
        for message in output.messages() {
            match from_sdk_message(message) {
                Some(message) => received.push(message),
                None => warn!(
                    event_name = "queue.sqs.incomplete_message",
                    message_id = message.message_id().unwrap_or("unknown"),
                    "skipping SQS message without id, receipt handle or body"
                ),
            }
        }
        Ok(received)
    }

    async fn delete_message(&self, receipt_handle: &str) -> Result<(), QueueError> {
        let result = self
            .client
            .delete_message()
            .queue_url(&self.queue_url)
            .receipt_handle(receipt_handle)
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(error)
                if error
                    .as_service_error()
                    .is_some_and(|service| service.is_receipt_handle_is_invalid()) =>
            {
                Err(QueueError::UnknownReceipt(receipt_handle.to_owned()))
            }
            Err(error) => Err(backend_error(error)),
        }
    }
}
