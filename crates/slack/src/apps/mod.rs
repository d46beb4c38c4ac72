//! Built-in command apps selectable through `APPS`.

use std::sync::Arc;

use crate::commands::CommandApp;

mod echo;
mod help;
mod memo;
mod ping;

pub use echo::EchoApp;
pub use help::HelpApp;
pub use memo::{MemoApp, MEMO_ROOT};
pub use ping::PingApp;

pub const BUILTIN_APP_NAMES: &[&str] = &["ping", "echo", "help", "memo"];

pub fn builtin_app(name: &str) -> Option<Arc<dyn CommandApp>> {
    match name {
        "ping" => Some(Arc::new(PingApp)),
        "echo" => Some(Arc::new(EchoApp)),
        "help" => Some(Arc::new(HelpApp)),
        "memo" => Some(Arc::new(MemoApp)),
        _ => None,
    }
}
