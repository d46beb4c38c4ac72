use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("parameter store backend failure: {0}")]
    Backend(String),
    #[error("parameter store returned an undecodable response: {0}")]
    Decode(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("queue backend failure: {0}")]
    Backend(String),
    #[error("receipt handle `{0}` does not match an in-flight message")]
    UnknownReceipt(String),
    #[error("queue returned an undecodable message: {0}")]
    Decode(String),
}

#[derive(Debug, Error)]
pub enum EventDecodeError {
    #[error("event body is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
