use async_trait::async_trait;

use crate::commands::{AppError, CommandApp};
use crate::robot::Robot;

pub struct HelpApp;

#[async_trait]
impl CommandApp for HelpApp {
    fn name(&self) -> &'static str {
        "help"
    }

    fn commands(&self) -> &'static [&'static str] {
        &["help"]
    }

    fn doc(&self) -> &'static str {
        "Shows this usage document."
    }

    async fn run(
        &self,
        robot: &Robot,
        channel: &str,
        _user: &str,
        _payload: &str,
    ) -> Result<(), AppError> {
        robot.post_message(channel, &robot.usage().join("\n")).await?;
        Ok(())
    }
}
