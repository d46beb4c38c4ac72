use serde::{Deserialize, Serialize};

use crate::errors::EventDecodeError;

/// One inbound chat message, as carried in a queue message body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub channel: String,
    pub user: String,
    pub text: String,
}

impl Event {
    pub fn new(
        channel: impl Into<String>,
        user: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self { channel: channel.into(), user: user.into(), text: text.into() }
    }

    pub fn decode(body: &str) -> Result<Self, EventDecodeError> {
        Ok(serde_json::from_str(body)?)
    }

    pub fn encode(&self) -> Result<String, EventDecodeError> {
        Ok(serde_json::to_string(self)?)
    }
}
