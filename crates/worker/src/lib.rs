//! Wiring from configuration to a running robot, plus the Lambda SQS adapter.

pub mod bootstrap;
pub mod lambda;
pub mod logging;

pub use bootstrap::{
    bootstrap, bootstrap_with_chat, bootstrap_with_config, Application, BootstrapError,
};
pub use lambda::handle_sqs_event;
pub use logging::init_logging;
