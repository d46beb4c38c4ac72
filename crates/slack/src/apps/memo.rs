use async_trait::async_trait;

use crate::commands::{AppError, CommandApp};
use crate::robot::Robot;

pub const MEMO_ROOT: &str = "/queuebot/memo";
const MAX_KEY_LEN: usize = 64;

/// Per-user notes kept in the brain under `/queuebot/memo/<user>/<key>`.
pub struct MemoApp;

#[derive(Debug, PartialEq, Eq)]
enum MemoCommand<'a> {
    Set { key: &'a str, value: &'a str },
    Get { key: &'a str },
    List,
}

fn parse_memo(payload: &str) -> Option<MemoCommand<'_>> {
    let mut parts = payload.trim().splitn(3, ' ');
    let verb = parts.next().unwrap_or_default();
    let key = parts.next().map(str::trim).unwrap_or_default();
    let value = parts.next().map(str::trim).unwrap_or_default();

    match verb {
        "set" if is_valid_segment(key) && !value.is_empty() => {
            Some(MemoCommand::Set { key, value })
        }
        "get" if is_valid_segment(key) && value.is_empty() => Some(MemoCommand::Get { key }),
        "list" if key.is_empty() => Some(MemoCommand::List),
        _ => None,
    }
}

fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment.len() <= MAX_KEY_LEN
        && segment.chars().all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '.'))
}

fn user_root(user: &str) -> String {
    format!("{MEMO_ROOT}/{user}")
}

#[async_trait]
impl CommandApp for MemoApp {
    fn name(&self) -> &'static str {
        "memo"
    }

    fn commands(&self) -> &'static [&'static str] {
        &["memo"]
    }

    fn doc(&self) -> &'static str {
        "Keeps personal notes: memo set <key> <value> | memo get <key> | memo list."
    }

    async fn run(
        &self,
        robot: &Robot,
        channel: &str,
        user: &str,
        payload: &str,
    ) -> Result<(), AppError> {
        if !is_valid_segment(user) {
            return Err(AppError::Rejected(format!("user id `{user}` cannot name a memo path")));
        }

        let Some(command) = parse_memo(payload) else {
            let hint = format!(
                "usage: {prefix}memo set <key> <value> | {prefix}memo get <key> | {prefix}memo list (keys use letters, digits, `_`, `-`, `.`)",
                prefix = robot.prefix()
            );
            robot.post_message(channel, &hint).await?;
            return Ok(());
        };

        let root = user_root(user);
        let reply = match command {
            MemoCommand::Set { key, value } => {
                robot.brain().store(&format!("{root}/{key}"), value).await?;
                format!("saved `{key}`")
            }
            MemoCommand::Get { key } => {
                let value = robot.brain().get(&format!("{root}/{key}")).await?;
                if value.is_empty() {
                    format!("no memo named `{key}`")
                } else {
                    value
                }
            }
            MemoCommand::List => {
                let memos = robot.brain().get_list(&root).await?;
                if memos.is_empty() {
                    "no memos yet".to_owned()
                } else {
                    let child_prefix = format!("{root}/");
                    memos
                        .iter()
                        .map(|memo| {
                            let key = memo
                                .name
                                .strip_prefix(child_prefix.as_str())
                                .unwrap_or(memo.name.as_str());
                            format!("{key}: {}", memo.value)
                        })
                        .collect::<Vec<_>>()
                        .join("\n")
                }
            }
        };

        robot.post_message(channel, &reply).await?;
        Ok(())
    }
}
