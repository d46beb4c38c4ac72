use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use queuebot_core::errors::QueueError;
use queuebot_core::queue::{MessageQueue, QueueMessage, MAX_RECEIVE_BATCH};
use sqlx::Row;
use uuid::Uuid;

use crate::DbPool;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Queue over the `queue_message` table with SQS-like visibility semantics:
/// a received message is hidden for `visibility_timeout` and can only be
/// deleted with the receipt handle of its latest delivery.
pub struct SqlMessageQueue {
    pool: DbPool,
    queue_name: String,
    visibility_timeout: Duration,
}

impl SqlMessageQueue {
    pub fn new(pool: DbPool, queue_name: impl Into<String>, visibility_timeout: Duration) -> Self {
        Self { pool, queue_name: queue_name.into(), visibility_timeout }
    }

    pub fn queue_name(&self) -> &str {
        &self.queue_name
    }

    async fn receive_visible(&self, limit: usize) -> Result<Vec<QueueMessage>, QueueError> {
        let now_ms = Utc::now().timestamp_millis();
        let hidden_until_ms = now_ms.saturating_add(
            i64::try_from(self.visibility_timeout.as_millis()).unwrap_or(i64::MAX),
        );
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let rows = sqlx::query(
            "SELECT message_id, body
             FROM queue_message
             WHERE queue_name = ? AND visible_at_ms <= ?
             ORDER BY sent_at_ms, rowid
             LIMIT ?",
        )
        .bind(&self.queue_name)
        .bind(now_ms)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&mut *tx)
        .await
        .map_err(db_error)?;

        let mut received = Vec::with_capacity(rows.len());
        for row in rows {
            let message_id: String = row.try_get("message_id").map_err(decode_error)?;
            let body: String = row.try_get("body").map_err(decode_error)?;
            let receipt_handle = Uuid::new_v4().to_string();

            sqlx::query(
                "UPDATE queue_message
                 SET receipt_handle = ?, visible_at_ms = ?, receive_count = receive_count + 1
                 WHERE message_id = ?",
            )
            .bind(&receipt_handle)
            .bind(hidden_until_ms)
            .bind(&message_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

            received.push(QueueMessage { message_id, receipt_handle, body });
        }

        tx.commit().await.map_err(db_error)?;
        Ok(received)
    }
}

fn db_error(error: sqlx::Error) -> QueueError {
    QueueError::Backend(error.to_string())
}

fn decode_error(error: sqlx::Error) -> QueueError {
    QueueError::Decode(error.to_string())
}

#[async_trait]
impl MessageQueue for SqlMessageQueue {
    async fn send_message(&self, body: &str) -> Result<String, QueueError> {
        let message_id = Uuid::new_v4().to_string();
        let now_ms = Utc::now().timestamp_millis();

        sqlx::query(
            "INSERT INTO queue_message (message_id, queue_name, body, visible_at_ms, sent_at_ms)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&message_id)
        .bind(&self.queue_name)
        .bind(body)
        .bind(now_ms)
        .bind(now_ms)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(message_id)
    }

    /// Polls until a message is visible or `wait` elapses.
    async fn receive_messages(
        &self,
        max_messages: usize,
        wait: Duration,
    ) -> Result<Vec<QueueMessage>, QueueError> {
        let limit = max_messages.clamp(1, MAX_RECEIVE_BATCH);
        let deadline = tokio::time::Instant::now() + wait;

        loop {
            let received = self.receive_visible(limit).await?;
            let now = tokio::time::Instant::now();
            if !received.is_empty() || now >= deadline {
                return Ok(received);
            }
            tokio::time::sleep(POLL_INTERVAL.min(deadline - now)).await;
        }
    }

    async fn delete_message(&self, receipt_handle: &str) -> Result<(), QueueError> {
        let result = sqlx::query(
            "DELETE FROM queue_message
             WHERE queue_name = ? AND receipt_handle = ?",
        )
        .bind(&self.queue_name)
        .bind(receipt_handle)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(QueueError::UnknownReceipt(receipt_handle.to_owned()));
        }
        Ok(())
    }
}
