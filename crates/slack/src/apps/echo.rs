use async_trait::async_trait;

use crate::commands::{AppError, CommandApp};
use crate::robot::Robot;

pub struct EchoApp;

#[async_trait]
impl CommandApp for EchoApp {
    fn name(&self) -> &'static str {
        "echo"
    }

    fn commands(&self) -> &'static [&'static str] {
        &["echo", "say"]
    }

    fn doc(&self) -> &'static str {
        "Repeats the given text back to the channel."
    }

    async fn run(
        &self,
        robot: &Robot,
        channel: &str,
        _user: &str,
        payload: &str,
    ) -> Result<(), AppError> {
        let text = payload.trim();
        if text.is_empty() {
            let hint = format!("usage: {}echo <text>", robot.prefix());
            robot.post_message(channel, &hint).await?;
            return Ok(());
        }

        robot.post_message(channel, text).await?;
        Ok(())
    }
}
