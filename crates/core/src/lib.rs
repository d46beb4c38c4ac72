//! Domain types and storage seams shared by every queuebot crate.

pub mod brain;
pub mod config;
pub mod errors;
pub mod event;
pub mod memory;
pub mod queue;

pub use brain::{Brain, Parameter, ParameterStore, ParameterType};
pub use config::{AppConfig, BackendKind, ConfigError, LoadOptions, LogFormat};
pub use errors::{EventDecodeError, QueueError, StoreError};
pub use event::Event;
pub use memory::{InMemoryMessageQueue, InMemoryParameterStore};
pub use queue::{MessageQueue, QueueMessage};
