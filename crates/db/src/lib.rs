//! SQLite backends for running queuebot without AWS.

pub mod connection;
pub mod migrations;
pub mod parameters;
pub mod queue;

pub use connection::{connect, connect_with_settings, is_memory_url, DbPool};
pub use parameters::SqlParameterStore;
pub use queue::SqlMessageQueue;
