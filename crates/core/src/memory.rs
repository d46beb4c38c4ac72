use std::collections::{BTreeMap, HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::brain::{is_under_path, Parameter, ParameterStore, ParameterType};
use crate::errors::{QueueError, StoreError};
use crate::queue::{MessageQueue, QueueMessage, MAX_RECEIVE_BATCH};

#[derive(Default)]
pub struct InMemoryParameterStore {
    parameters: RwLock<BTreeMap<String, Parameter>>,
}

#[async_trait]
impl ParameterStore for InMemoryParameterStore {
    async fn get_parameter(
        &self,
        name: &str,
        _with_decryption: bool,
    ) -> Result<Option<Parameter>, StoreError> {
        let parameters = self.parameters.read().await;
        Ok(parameters.get(name).cloned())
    }

    async fn put_parameter(
        &self,
        name: &str,
        value: &str,
        parameter_type: ParameterType,
    ) -> Result<(), StoreError> {
        let mut parameters = self.parameters.write().await;
        parameters.insert(
            name.to_owned(),
            Parameter { name: name.to_owned(), value: value.to_owned(), parameter_type },
        );
        Ok(())
    }

    async fn get_parameters_by_path(
        &self,
        path: &str,
        max_results: usize,
    ) -> Result<Vec<Parameter>, StoreError> {
        let parameters = self.parameters.read().await;
        Ok(parameters
            .values()
            .filter(|parameter| is_under_path(&parameter.name, path))
            .take(max_results)
            .cloned()
            .collect())
    }
}

struct StoredMessage {
    sequence: u64,
    message_id: String,
    body: String,
}

#[derive(Default)]
struct QueueState {
    next_sequence: u64,
    pending: VecDeque<StoredMessage>,
    in_flight: HashMap<String, StoredMessage>,
}

/// FIFO queue with SQS-style receipt handles, for tests and dry runs.
#[derive(Default)]
pub struct InMemoryMessageQueue {
    state: Mutex<QueueState>,
}

impl InMemoryMessageQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn pending_len(&self) -> usize {
        self.state.lock().await.pending.len()
    }

    pub async fn in_flight_len(&self) -> usize {
        self.state.lock().await.in_flight.len()
    }

    /// Returns every unacknowledged message to the front of the queue in send
    /// order, as if its visibility timeout had expired.
    pub async fn requeue_in_flight(&self) -> usize {
        let mut state = self.state.lock().await;
        let mut expired: Vec<StoredMessage> =
            state.in_flight.drain().map(|(_, message)| message).collect();
        expired.sort_by_key(|message| message.sequence);
        let count = expired.len();
        for message in expired.into_iter().rev() {
            state.pending.push_front(message);
        }
        count
    }
}

#[async_trait]
impl MessageQueue for InMemoryMessageQueue {
    async fn send_message(&self, body: &str) -> Result<String, QueueError> {
        let message_id = Uuid::new_v4().to_string();
        let mut state = self.state.lock().await;
        let sequence = state.next_sequence;
        state.next_sequence += 1;
        state.pending.push_back(StoredMessage {
            sequence,
            message_id: message_id.clone(),
            body: body.to_owned(),
        });
        Ok(message_id)
    }

    async fn receive_messages(
        &self,
        max_messages: usize,
        _wait: Duration,
    ) -> Result<Vec<QueueMessage>, QueueError> {
        let mut state = self.state.lock().await;
        let mut received = Vec::new();
        while received.len() < max_messages.clamp(1, MAX_RECEIVE_BATCH) {
            let Some(message) = state.pending.pop_front() else {
                break;
            };
            let receipt_handle = Uuid::new_v4().to_string();
            received.push(QueueMessage {
                message_id: message.message_id.clone(),
                receipt_handle: receipt_handle.clone(),
                body: message.body.clone(),
            });
            state.in_flight.insert(receipt_handle, message);
        }
        Ok(received)
    }

    async fn delete_message(&self, receipt_handle: &str) -> Result<(), QueueError> {
        let mut state = self.state.lock().await;
        state
            .in_flight
            .remove(receipt_handle)
            .map(|_| ())
            .ok_or_else(|| QueueError::UnknownReceipt(receipt_handle.to_owned()))
    }
}
