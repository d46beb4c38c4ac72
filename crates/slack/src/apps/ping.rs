use async_trait::async_trait;

use crate::commands::{AppError, CommandApp};
use crate::robot::Robot;

pub struct PingApp;

#[async_trait]
impl CommandApp for PingApp {
    fn name(&self) -> &'static str {
        "ping"
    }

    fn commands(&self) -> &'static [&'static str] {
        &["ping"]
    }

    fn doc(&self) -> &'static str {
        "Replies with pong."
    }

    async fn run(
        &self,
        robot: &Robot,
        channel: &str,
        _user: &str,
        _payload: &str,
    ) -> Result<(), AppError> {
        robot.post_message(channel, "pong").await?;
        Ok(())
    }
}
