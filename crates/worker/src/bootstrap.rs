use std::sync::Arc;
use std::time::Duration;

use queuebot_aws::{load_sdk_config, SqsMessageQueue, SsmParameterStore};
use queuebot_core::brain::ParameterStore;
use queuebot_core::config::{AppConfig, BackendKind, ConfigError, LoadOptions};
use queuebot_core::queue::MessageQueue;
use queuebot_db::{connect, migrations, SqlMessageQueue, SqlParameterStore};
use queuebot_slack::chat::{ChatApi, ChatError, SlackWebClient};
use queuebot_slack::commands::{CommandRegistry, RegistryError};
use queuebot_slack::robot::Robot;
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub robot: Arc<Robot>,
    pub store: Arc<dyn ParameterStore>,
    pub queue: Arc<dyn MessageQueue>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Chat(#[from] ChatError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    let chat = SlackWebClient::new(
        config.chat.post_message_url.clone(),
        Duration::from_secs(config.chat.timeout_secs),
    )?;
    bootstrap_with_chat(config, Arc::new(chat)).await
}

/// Builds the registry before touching any backend so a bad `APPS` value
/// fails without network or disk access.
pub async fn bootstrap_with_chat(
    config: AppConfig,
    chat: Arc<dyn ChatApi>,
) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        backend = ?config.backend.kind,
        "starting application bootstrap"
    );
    let registry = CommandRegistry::from_app_names(&config.bot.apps, &config.bot.command_prefix)?;
    info!(
        event_name = "system.bootstrap.registry_built",
        correlation_id = "bootstrap",
        keywords = registry.len(),
        "command registry built"
    );

    let (store, queue) = connect_backend(&config).await?;
    let robot = Robot::new(config.bot.access_token_key.clone(), registry, Arc::clone(&store), chat);
    info!(
        event_name = "system.bootstrap.ready",
        correlation_id = "bootstrap",
        "application bootstrap complete"
    );

    Ok(Application { config, robot: Arc::new(robot), store, queue })
}

async fn connect_backend(
    config: &AppConfig,
) -> Result<(Arc<dyn ParameterStore>, Arc<dyn MessageQueue>), BootstrapError> {
    match config.backend.kind {
        BackendKind::Aws => {
            let sdk_config = load_sdk_config(config.backend.aws_region.as_deref()).await;
            let store = SsmParameterStore::from_sdk_config(&sdk_config);
            let queue = SqsMessageQueue::from_sdk_config(&sdk_config, config.queue.url.clone());
            Ok((Arc::new(store), Arc::new(queue)))
        }
        BackendKind::Local => {
            let pool = connect(&config.backend.database_url)
                .await
                .map_err(BootstrapError::DatabaseConnect)?;
            info!(
                event_name = "system.bootstrap.database_connected",
                correlation_id = "bootstrap",
                "database connection established"
            );

            migrations::run_pending(&pool).await.map_err(BootstrapError::Migration)?;
            info!(
                event_name = "system.bootstrap.migrations_applied",
                correlation_id = "bootstrap",
                "database migrations applied"
            );

            let visibility_timeout =
                Duration::from_secs(u64::from(config.queue.visibility_timeout_secs));
            let store = SqlParameterStore::new(pool.clone());
            let queue = SqlMessageQueue::new(pool, config.queue.url.clone(), visibility_timeout);
            Ok((Arc::new(store), Arc::new(queue)))
        }
    }
}
