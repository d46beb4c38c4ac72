//! Chat-side half of queuebot.
//!
//! - **Chat API** (`chat`) - `chat.postMessage` client behind the `ChatApi` seam
//! - **Commands** (`commands`) - `<prefix><keyword> <payload>` grammar and the `CommandRegistry`
//! - **Apps** (`apps`) - built-in command apps (`ping`, `echo`, `help`, `memo`)
//! - **Robot** (`robot`) - token cache, dispatch, reply with one `invalid_auth` retry
//! - **Consumer** (`consumer`) - queue batch handling with delete-on-success
//!
//! ```text
//! Queue batch → handle_batch → Robot::handle_event → CommandApp::run
//!                    ↓                                     ↓
//!            delete_message                     Robot::post_message → chat API
//! ```

pub mod apps;
pub mod chat;
pub mod commands;
pub mod consumer;
pub mod robot;

#[cfg(test)]
pub(crate) mod testing;

pub use chat::{ChatApi, ChatError, ChatResponse, SlackWebClient};
pub use commands::{AppError, CommandApp, CommandRegistry, RegistryError};
pub use consumer::{handle_batch, poll_once, BatchRecord, BatchReport, RecordOutcome};
pub use robot::{DispatchOutcome, Robot};
